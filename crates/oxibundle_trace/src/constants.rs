//! File names and extensions used while tracing and loading modules.

/// Extensions of files the tracer parses and the collector accepts as entries
pub const JS_TS_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// Extensions appended to extensionless requests, in priority order
pub const RESOLVE_EXTENSIONS: &[&str] = JS_TS_EXTENSIONS;

/// Index files tried when a request resolves to a directory
pub const INDEX_FILES: &[&str] = &[
    "index.ts",
    "index.tsx",
    "index.mts",
    "index.cts",
    "index.js",
    "index.jsx",
    "index.mjs",
    "index.cjs",
];

/// `package.json` fields naming a package entry point, after `exports`
pub const MAIN_FIELDS: &[&str] = &["module", "main"];

/// Conditions tried inside a conditional `exports["."]` entry
pub const EXPORT_CONDITIONS: &[&str] = &["import", "require", "default"];

pub const TSCONFIG_FILE_NAME: &str = "tsconfig.json";

/// Default name of the bundle options file looked up at the project root
pub const BUNDLE_CONFIG_FILE_NAME: &str = "oxibundle.json";
