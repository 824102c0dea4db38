/// Number of hex characters kept from a SHA-256 digest in an `ObjectHash`.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// File extension of compiled binary modules when not configured.
pub const DEFAULT_MODULE_EXTENSION: &str = "swiftmodule";

/// File extension of module documentation artifacts when not configured.
pub const DEFAULT_DOC_EXTENSION: &str = "swiftdoc";

/// File extensions accepted as static archives by the command toolchain.
pub const ARCHIVE_EXTENSIONS: &[&str] = &["a", "lo"];
