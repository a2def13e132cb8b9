//! Default configuration values

/// Directory holding downloaded archives and extracted sources
pub const SOURCE_DIR: &str = "source";

/// Directory holding HTTP validation tokens
pub const CACHE_DIR: &str = "cache";

/// Name of the package name -> extracted path index (under [`SOURCE_DIR`])
pub const SOURCE_INDEX_FILE: &str = "valid_sources";

/// Directory the image tree is assembled in
pub const IMAGE_DIR: &str = "image";

/// Directory the packaged image is written to
pub const OUTPUT_DIR: &str = "output";

/// Library directory inside the image root
pub const LIBRARY_DIR: &str = "lib";

/// Default packaged image name
pub const IMAGE_NAME: &str = "rootfs.squashfs";

/// Default filesystem-image packaging command; `{root}` and `{output}` are substituted
pub const PACKAGER: &str = "mksquashfs {root} {output} -noappend -all-root";

/// Default patch utility invocation; the patch file path is appended
pub const PATCH_COMMAND: &str = "patch -p1 -i";

/// Placeholder replaced by the cross-compiler prefix in command templates
pub const CROSS_COMPILER_TOKEN: &str = "cross_compiler";

/// Environment variable consulted when the manifest carries no token
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Environment variable overriding the workspace root
pub const WORK_DIR_ENV: &str = "CROSSROOT_WORK_DIR";

/// HTTP request timeout (seconds)
pub const HTTP_TIMEOUT_SECS: u64 = 300;

/// HTTP connect timeout (seconds)
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 30;
