//! ---
//! mkp_section: "03-observability-logging"
//! mkp_subsection: "module"
//! mkp_type: "source"
//! mkp_scope: "code"
//! mkp_description: "Structured logging adapters for registration events."
//! mkp_version: "v0.0.0-prealpha"
//! mkp_owner: "tbd"
//! ---
//! Logging macros that stamp every event with the registration context.

#[doc(hidden)]
#[macro_export]
macro_rules! __mkp_event {
    ($level:expr, $ctx:expr, $($arg:tt)+) => {{
        let ctx = &$ctx;
        tracing::event!(
            $level,
            scope = ctx.scope.unwrap_or(""),
            controller = ctx.controller.unwrap_or(""),
            mode = ctx.mode.unwrap_or(""),
            position = ctx.position.unwrap_or_default(),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an informational log enriched with registration context.
#[macro_export]
macro_rules! mkp_info {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__mkp_event!(tracing::Level::INFO, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__mkp_event!(tracing::Level::INFO, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a debug log enriched with registration context.
#[macro_export]
macro_rules! mkp_debug {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__mkp_event!(tracing::Level::DEBUG, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__mkp_event!(tracing::Level::DEBUG, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a warning enriched with registration context.
#[macro_export]
macro_rules! mkp_warn {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__mkp_event!(tracing::Level::WARN, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__mkp_event!(tracing::Level::WARN, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit an error log enriched with registration context.
#[macro_export]
macro_rules! mkp_error {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__mkp_event!(tracing::Level::ERROR, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__mkp_event!(tracing::Level::ERROR, $crate::LogContext::default(), $($arg)+)
    };
}
