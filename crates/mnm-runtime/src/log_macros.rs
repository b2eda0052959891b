//! Domain-tagged logging macros.
//!
//! Each macro adds a `domain` field so the plain formatter can render it as a
//! `[domain]` prefix. Domains in use: `sys` (subscriber and process setup),
//! `conf` (configuration loading), `pipe` (filter and resample runs).
//!
//! ```ignore
//! mnm_info!(conf, path = %path.display(), "configuration loaded");
//! mnm_debug!(pipe, rows_in = 10, rows_out = 2, "resample finished");
//! ```
//!
//! The domain is a bare identifier, not a string.

#[doc(hidden)]
macro_rules! mnm_log {
    ($level:ident, $domain:ident, $($field:tt)*) => {
        tracing::$level!(domain = stringify!($domain), $($field)*)
    };
}

#[allow(unused_macros)]
macro_rules! mnm_error {
    ($domain:ident, $($rest:tt)*) => {
        mnm_log!(error, $domain, $($rest)*)
    };
}

macro_rules! mnm_warn {
    ($domain:ident, $($rest:tt)*) => {
        mnm_log!(warn, $domain, $($rest)*)
    };
}

macro_rules! mnm_info {
    ($domain:ident, $($rest:tt)*) => {
        mnm_log!(info, $domain, $($rest)*)
    };
}

macro_rules! mnm_debug {
    ($domain:ident, $($rest:tt)*) => {
        mnm_log!(debug, $domain, $($rest)*)
    };
}

#[allow(unused_macros)]
macro_rules! mnm_trace {
    ($domain:ident, $($rest:tt)*) => {
        mnm_log!(trace, $domain, $($rest)*)
    };
}
