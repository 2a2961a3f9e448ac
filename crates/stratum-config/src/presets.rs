//! Presets that flip well-known settings on a resolved tree.

use serde_json::{json, Map, Value};

use crate::{ConfigTree, ContextPath};

/// Path of the site name shown in the administration interface.
pub const SITENAME_PATH: &str = "SYS.sitename";

/// Path of the per-level log writer configuration.
pub const LOG_WRITERS_PATH: &str = "LOG.writerConfiguration";

/// Path of the deprecation log file writer switch.
pub const DEPRECATION_WRITER_PATH: &str =
    "LOG.deprecations.writerConfiguration.notice.file.disabled";

/// Error mask covering only fatal errors (error, parse, core, compile,
/// user and recoverable errors).
pub const FATAL_ERROR_MASK: i64 = 1 | 4 | 16 | 64 | 256 | 4096;

/// Error mask covering every error level.
pub const ALL_ERRORS_MASK: i64 = 32767;

/// Cache the development preset keeps persistent.
pub const DEVELOPMENT_KEPT_CACHE: &str = "api";

/// Debug output, verbose errors and warning-level file logging.
///
/// Also keeps [`DEVELOPMENT_KEPT_CACHE`] out of the development cache
/// downgrade.
pub fn development(tree: &mut ConfigTree) {
    tree.set("BE.debug", json!(true));
    tree.set("FE.debug", json!(true));
    tree.set("SYS.devIPmask", json!("*"));
    tree.set("SYS.displayErrors", json!(1));
    tree.set("SYS.belogErrorReporting", json!(ALL_ERRORS_MASK));
    tree.set("SYS.exceptionalErrors", json!(ALL_ERRORS_MASK));
    tree.set_path(
        &[
            "EXTCONF",
            "stratum",
            "caching",
            "cacheConfigurations",
            DEVELOPMENT_KEPT_CACHE,
            "uncache",
        ],
        json!(false),
    );
    enable_deprecation_logging(tree);
    tree.set(
        &format!("{LOG_WRITERS_PATH}.warning"),
        json!({"file": {"disabled": false}}),
    );
}

/// No debug output and error-level file logging only.
///
/// Log writers that are already configured keep their settings.
pub fn production(tree: &mut ConfigTree) {
    tree.set("BE.debug", json!(false));
    tree.set("FE.debug", json!(false));
    tree.set("SYS.devIPmask", json!(""));
    tree.set("SYS.displayErrors", json!(-1));
    tree.set("SYS.belogErrorReporting", json!(FATAL_ERROR_MASK));
    tree.set("SYS.exceptionalErrors", json!(FATAL_ERROR_MASK));
    disable_deprecation_logging(tree);

    let mut defaults = ConfigTree::new();
    defaults.set(
        LOG_WRITERS_PATH,
        json!({
            "debug": {"file": {"disabled": true}},
            "info": {"file": {"disabled": true}},
            "warning": {"file": {"disabled": true}},
            "error": {"file": {"disabled": false}},
        }),
    );
    tree.merge_defaults(into_map(defaults.into_value()));
}

/// Turn the deprecation log file writer on.
pub fn enable_deprecation_logging(tree: &mut ConfigTree) {
    tree.set(DEPRECATION_WRITER_PATH, json!(false));
}

/// Turn the deprecation log file writer off.
pub fn disable_deprecation_logging(tree: &mut ConfigTree) {
    tree.set(DEPRECATION_WRITER_PATH, json!(true));
}

/// Append `(<context>)` to the site name.
///
/// The short form keeps only the first character of every segment, so
/// `Development/Local` is shown as `(D/L)`.
pub fn append_context_to_site_name(tree: &mut ConfigTree, context: &ContextPath, short: bool) {
    let suffix = if short {
        context.abbreviated()
    } else {
        context.as_str().to_string()
    };
    let current = tree
        .get(SITENAME_PATH)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    tree.set(SITENAME_PATH, json!(format!("{current}({suffix})")));
}

/// Settings for a local container stack: database, image processing, mail catcher.
pub fn local_container(tree: &mut ConfigTree) {
    tree.merge(into_map(json!({
        "DB": {
            "Connections": {
                "Default": {
                    "dbname": "db",
                    "host": "db",
                    "password": "db",
                    "port": "3306",
                    "user": "db",
                },
            },
        },
        "GFX": {
            "processor": "ImageMagick",
            "processor_path": "/usr/bin/",
            "processor_path_lzw": "/usr/bin/",
        },
        "MAIL": {
            "transport": "smtp",
            "transport_smtp_server": "localhost:1025",
        },
        "SYS": {
            "trustedHostsPattern": ".*.*",
            "fileCreateMask": "0666",
            "folderCreateMask": "2777",
        },
    })));
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
