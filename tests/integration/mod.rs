/// Integration test harness
///
/// Runs the storage, tools and MCP server against real SQLite files.

mod basic_integration;
mod mcp_workflow;
