//! Tools domain module.
//!
//! This module handles all tool-related functionality for the MCP server.
//! Tools are executable functions that can be called by MCP clients.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `router.rs` - Dynamic ToolRouter builder
//!
//! Tool routes stay thin: they mint a `ToolRequest` from the raw arguments
//! and hand it to the gateway dispatcher, which owns validation, admission,
//! credentials, and error classification.
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/` (e.g., `my_tool.rs`)
//! 2. Define params, `to_tool()`, and `create_route()`
//! 3. Export in `definitions/mod.rs`
//! 4. Add route in `router.rs` using `with_route()`
//! 5. Teach `gateway::validator` the new tool's constraints

pub mod definitions;
pub mod router;

pub use router::build_tool_router;
