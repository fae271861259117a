//! Exit code constants for the nixkil CLI.
//!
//! - 0: Success
//! - 1: User error (bad parameters, bad config, unknown operation)
//! - 2: The external tool ran and reported an error
//! - 3: The external tool could not be launched
//! - 4: The external tool exceeded its time budget

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: invalid parameters, invalid config, or missing knowledge entry.
pub const USER_ERROR: i32 = 1;

/// The external tool exited non-zero.
pub const TOOL_REPORTED_ERROR: i32 = 2;

/// The external tool is not installed, not on PATH, or not executable.
pub const TOOL_UNAVAILABLE: i32 = 3;

/// The external tool was terminated after exceeding its timeout.
pub const TIMEOUT: i32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [SUCCESS, USER_ERROR, TOOL_REPORTED_ERROR, TOOL_UNAVAILABLE, TIMEOUT];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn exit_codes_fit_in_a_byte() {
        for code in [SUCCESS, USER_ERROR, TOOL_REPORTED_ERROR, TOOL_UNAVAILABLE, TIMEOUT] {
            assert!((0..=255).contains(&code));
        }
    }
}
