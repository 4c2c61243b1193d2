pub mod generate;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

/// Environment variable holding a release version to write instead of the template's.
pub const RELEASE_VSN_ENV: &str = "RELPIN_RELEASE_VSN";

pub fn release_version_override() -> Option<String> {
    std::env::var(RELEASE_VSN_ENV)
        .ok()
        .filter(|v| !v.is_empty())
}
