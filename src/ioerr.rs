// Build a std::io::Error from an ErrorKind variant name, and optionally
// a message or a format string with arguments.
//
//     ioerr!(UnexpectedEof)
//     ioerr!(InvalidData, "chpl: bad count")
//     ioerr!(InvalidData, "stco: {} entries, expected {}", n, count)
//
macro_rules! ioerr {
    ($kind:ident) => {
        ::std::io::Error::from(::std::io::ErrorKind::$kind)
    };
    ($kind:ident, $msg:expr) => {
        ::std::io::Error::new(::std::io::ErrorKind::$kind, $msg)
    };
    ($kind:ident, $fmt:expr, $($arg:tt)+) => {
        ::std::io::Error::new(::std::io::ErrorKind::$kind, format!($fmt, $($arg)+))
    };
}
