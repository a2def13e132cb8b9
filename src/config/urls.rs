//! Service endpoints

/// GitHub GraphQL endpoint used for latest-tag lookup
pub const GITHUB_GRAPHQL: &str = "https://api.github.com/graphql";

/// Host that serves `<owner>/<name>/archive/<commit>.tar.gz`
pub const GITHUB_ARCHIVE_HOST: &str = "https://github.com";
