//! Forwarding of `log` records to a callback installed by the host.

use std::{
    ffi::CString,
    os::raw::{c_char, c_void},
    sync::OnceLock,
};

use log::{Level, LevelFilter, Log, Metadata, Record};
use parking_lot::{const_rwlock, RwLock};
use strum::FromRepr;

/// cbindgen:rename-all=ScreamingSnakeCase
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
pub enum SmtLogLevelEXT {
    SmtLogLevelTrace = 0,
    SmtLogLevelDebug = 1,
    SmtLogLevelInfo = 2,
    SmtLogLevelWarn = 3,
    SmtLogLevelError = 4,
    SmtLogLevelOff = 5,
}

impl From<Level> for SmtLogLevelEXT {
    fn from(value: Level) -> Self {
        match value {
            Level::Trace => SmtLogLevelEXT::SmtLogLevelTrace,
            Level::Debug => SmtLogLevelEXT::SmtLogLevelDebug,
            Level::Info => SmtLogLevelEXT::SmtLogLevelInfo,
            Level::Warn => SmtLogLevelEXT::SmtLogLevelWarn,
            Level::Error => SmtLogLevelEXT::SmtLogLevelError,
        }
    }
}

impl From<SmtLogLevelEXT> for LevelFilter {
    fn from(value: SmtLogLevelEXT) -> Self {
        match value {
            SmtLogLevelEXT::SmtLogLevelTrace => LevelFilter::Trace,
            SmtLogLevelEXT::SmtLogLevelDebug => LevelFilter::Debug,
            SmtLogLevelEXT::SmtLogLevelInfo => LevelFilter::Info,
            SmtLogLevelEXT::SmtLogLevelWarn => LevelFilter::Warn,
            SmtLogLevelEXT::SmtLogLevelError => LevelFilter::Error,
            SmtLogLevelEXT::SmtLogLevelOff => LevelFilter::Off,
        }
    }
}

/// cbindgen:rename-all=CamelCase
#[repr(C)]
pub struct SmtLogMessageEXT {
    pub level: SmtLogLevelEXT,
    pub message: *const c_char,
    pub target: *const c_char,
    pub file: *const c_char, // nullable
    pub line: u32,
    pub p_next: *mut c_void, // opaque, must be null for now
}

#[allow(non_camel_case_types)]
pub type SmtLogCallback_PFN = extern "C" fn(message: *const SmtLogMessageEXT);

struct CallbackLogger {
    callback: RwLock<Option<SmtLogCallback_PFN>>,
}

static LOGGER: CallbackLogger = CallbackLogger {
    callback: const_rwlock(None),
};
static REGISTERED: OnceLock<bool> = OnceLock::new();

impl Log for CallbackLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level() && self.callback.read().is_some()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let Some(callback) = *self.callback.read() else {
            return;
        };

        // Interior NUL bytes would truncate the C string; they are dropped instead.
        let message = CString::new(record.args().to_string().replace('\0', "")).unwrap_or_default();
        let target = CString::new(record.target().replace('\0', "")).unwrap_or_default();
        let file = record
            .file()
            .and_then(|f| CString::new(f.replace('\0', "")).ok());

        let msg = SmtLogMessageEXT {
            level: record.level().into(),
            message: message.as_ptr(),
            target: target.as_ptr(),
            file: file.as_ref().map_or(std::ptr::null(), |f| f.as_ptr()),
            line: record.line().unwrap_or(0),
            p_next: std::ptr::null_mut(),
        };
        callback(&msg);
    }

    fn flush(&self) {}
}

/// Route every record at or above `level` to `callback`; `None` detaches it.
///
/// Returns `false`, changing nothing, when another logger was registered with the
/// `log` facade first.
pub fn install(level: SmtLogLevelEXT, callback: Option<SmtLogCallback_PFN>) -> bool {
    let registered = *REGISTERED.get_or_init(|| log::set_logger(&LOGGER).is_ok());
    if !registered {
        return false;
    }
    *LOGGER.callback.write() = callback;
    log::set_max_level(match callback {
        Some(_) => level.into(),
        None => LevelFilter::Off,
    });
    true
}

/// Change the level filter without touching the callback.
pub fn set_level(filter: LevelFilter) {
    if LOGGER.callback.read().is_some() {
        log::set_max_level(filter);
    }
}
