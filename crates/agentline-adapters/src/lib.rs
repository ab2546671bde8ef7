// Error types
pub mod error;

// Shared line-parsing primitives
pub mod support;

// Tool adapter implementations (strategies behind the registry dispatch)
mod claude;
mod codex;
mod cursor;
mod gemini;
mod opencode;

// Tool registry (tagged-union dispatch on tool id)
pub mod registry;

// Envelope dispatch and sequencing
pub mod pipeline;

// Call/result correlation
pub mod correlate;

// Session recording reader
pub mod io;

// Registry
pub use registry::{Tool, ToolMetadata, get_tool_ids, get_tool_metadata, known_tools};

// Pipeline
pub use pipeline::normalize_session;

// Correlation
pub use correlate::{Correlation, correlate_results};

// Session recordings
pub use io::read_session_file;

// Error types
pub use error::{Error, Result};
