use std::{env, path::PathBuf};

use dirs;

/// Session cache file name under the user's home directory
pub const SESSION_FILE_NAME: &str = ".awssudo";

/// Environment variable that overrides the session cache location
pub const SESSION_FILE_ENV: &str = "AWS_SU_SESSION_FILE";

/// AWS configuration directory name
pub const AWS_CONFIG_DIR_NAME: &str = ".aws";

/// AWS configuration file name
pub const AWS_CONFIG_FILE_NAME: &str = "config";

/// Default role session duration in seconds (8 hours)
pub const DEFAULT_DURATION_SECONDS: u64 = 28800;

/// Minimum session duration accepted by STS AssumeRole
pub const MIN_DURATION_SECONDS: u64 = 900;

/// Maximum session duration accepted by STS AssumeRole
pub const MAX_DURATION_SECONDS: u64 = 43200;

/// Profile whose shared credentials sign the STS call when none is configured
pub const DEFAULT_SOURCE_PROFILE: &str = "default";

/// Textual format of `AWS_TOKEN_TTL`, local time
pub const TOKEN_TTL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Prefix of the remote role session name
pub const SESSION_NAME_PREFIX: &str = "aws-su-session";

pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
pub const AWS_SECURITY_TOKEN: &str = "AWS_SECURITY_TOKEN";
pub const AWS_TOKEN_TTL: &str = "AWS_TOKEN_TTL";
pub const AWS_PROFILE: &str = "AWS_PROFILE";

/// Get the session cache file path
/// Respects AWS_SU_SESSION_FILE environment variable if set
pub fn get_session_file_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(SESSION_FILE_ENV) {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|home| home.join(SESSION_FILE_NAME))
}

/// Get the AWS config file path
/// Respects AWS_CONFIG_FILE environment variable if set
pub fn get_aws_config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("AWS_CONFIG_FILE") {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|home| home.join(AWS_CONFIG_DIR_NAME).join(AWS_CONFIG_FILE_NAME))
}
