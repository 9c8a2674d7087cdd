/// State management module
/// 
/// This module handles all application state, including:
/// - Shared data structures (data.rs)
/// - Drawing tool selection and stroke width (tool.rs)
/// - The owned session record: current sketch, history, busy flag (session.rs)

pub mod data;
pub mod session;
pub mod tool;
