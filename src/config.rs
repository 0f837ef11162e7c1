// ABOUTME: Version and REPL constants for the driver

pub const VERSION: &str = "1.0.0";
pub const WELCOME_MESSAGE: &str = "palisp v1.0";
pub const WELCOME_SUBTITLE: &str =
    "partial application, first-class continuations, tail-safe evaluation";
pub const PROMPT: &str = "palisp> ";
pub const HISTORY_FILE: &str = ".palisp_history";
