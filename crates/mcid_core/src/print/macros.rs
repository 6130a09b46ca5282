#[doc(hidden)]
#[macro_export]
macro_rules! __log_line {
    ($kind:ident, $sink:ident, $($arg:tt)*) => {{
        let msg = format!("{}", format_args!($($arg)*));
        let redacted = $crate::print::auto_redact(&msg);
        if $crate::print::is_print() {
            $crate::print::print_to_terminal(&redacted, $crate::print::LogType::$kind);
        }
        $crate::print::$sink(&redacted, $crate::print::LogType::$kind);
    }};
}

/// Print an informational message.
///
/// `info!(no_log, ...)` keeps the message out of the log file.
#[macro_export]
macro_rules! info {
    (no_log, $($arg:tt)*) => {
        $crate::__log_line!(Info, print_to_memory, $($arg)*)
    };
    ($($arg:tt)*) => {
        $crate::__log_line!(Info, print_to_file, $($arg)*)
    };
}

/// Print an error message (to stderr)
#[macro_export]
macro_rules! err {
    (no_log, $($arg:tt)*) => {
        $crate::__log_line!(Error, print_to_memory, $($arg)*)
    };
    ($($arg:tt)*) => {
        $crate::__log_line!(Error, print_to_file, $($arg)*)
    };
}

/// Print a point message, i.e. a small step in some process
#[macro_export]
macro_rules! pt {
    (no_log, $($arg:tt)*) => {
        $crate::__log_line!(Point, print_to_memory, $($arg)*)
    };
    ($($arg:tt)*) => {
        $crate::__log_line!(Point, print_to_file, $($arg)*)
    };
}
