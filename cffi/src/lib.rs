use std::{
    ffi::CStr,
    os::raw::{c_char, c_void},
};

use num_bigint::BigUint;
use parking_lot::{const_rwlock, RwLock};
use smtmodel::{
    BindingConfig, Model, ModelBuilder, ModelError, ValueHandle, ValueKind, ValueReader,
};
use smtnum::{CodecLimits, NumError, SignMagnitude};

pub mod log_ext;

pub use log_ext::{SmtLogCallback_PFN, SmtLogLevelEXT, SmtLogMessageEXT};

pub struct SmtModel(Model);
pub struct SmtModelBuilder(ModelBuilder);

/// cbindgen:rename-all=ScreamingSnakeCase
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtResult {
    SmtResultSuccess,
    SmtResultInvalidPointer,
    SmtResultInvalidTag,
    SmtResultInvalidHandle,
    SmtResultKindMismatch,
    SmtResultBufferTooSmall,
    SmtResultUndefinedValue,
    SmtResultNotRepresentable,
    SmtResultOutOfMemory,
    SmtResultInvalidTerm,
    SmtResultMalformedValue,
    SmtResultEmptyInput,
    SmtResultZeroDenominator,
    SmtResultSignMismatch,
    SmtResultParseError,
    SmtResultIoError,
    SmtResultConfigParseError,
    SmtResultUtf8Error,
    SmtResultLoggerAlreadySet,
}

impl From<NumError> for SmtResult {
    fn from(value: NumError) -> Self {
        match value {
            NumError::EmptyInput => SmtResult::SmtResultEmptyInput,
            NumError::ZeroDenominator => SmtResult::SmtResultZeroDenominator,
            NumError::AllocationFailure { .. } => SmtResult::SmtResultOutOfMemory,
            NumError::SignMismatch => SmtResult::SmtResultSignMismatch,
            NumError::ExponentOutOfRange(_) | NumError::Parse { .. } => {
                SmtResult::SmtResultParseError
            }
        }
    }
}

impl From<ModelError> for SmtResult {
    fn from(value: ModelError) -> Self {
        match value {
            ModelError::InvalidTag(_) => SmtResult::SmtResultInvalidTag,
            ModelError::InvalidHandle { .. } => SmtResult::SmtResultInvalidHandle,
            ModelError::KindMismatch { .. } | ModelError::NotComposite { .. } => {
                SmtResult::SmtResultKindMismatch
            }
            ModelError::BufferTooSmall { .. } => SmtResult::SmtResultBufferTooSmall,
            ModelError::UndefinedValue { .. } => SmtResult::SmtResultUndefinedValue,
            ModelError::NotRepresentable { .. } => SmtResult::SmtResultNotRepresentable,
            ModelError::AllocationFailure { .. } => SmtResult::SmtResultOutOfMemory,
            ModelError::InvalidTerm(_) => SmtResult::SmtResultInvalidTerm,
            ModelError::MalformedValue(_) => SmtResult::SmtResultMalformedValue,
            ModelError::Num(err) => err.into(),
            ModelError::Io(_) => SmtResult::SmtResultIoError,
            ModelError::ConfigParse { .. } => SmtResult::SmtResultConfigParseError,
        }
    }
}

/// cbindgen:rename-all=CamelCase
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SmtVersionInfo {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

/// Value handle as seen from C: a kind tag and a node index.
/// cbindgen:rename-all=CamelCase
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmtValueHandle {
    pub tag: i32,
    pub id: i32,
}

impl SmtValueHandle {
    fn to_handle(self) -> Result<ValueHandle, SmtResult> {
        ValueHandle::from_raw(self.tag, self.id).map_err(SmtResult::from)
    }

    /// Kind of this handle, if its tag is known.
    pub fn kind(&self) -> Option<ValueKind> {
        ValueKind::from_repr(self.tag)
    }

    fn from_handle(handle: ValueHandle) -> Result<Self, SmtResult> {
        let id = i32::try_from(handle.id).map_err(|_| SmtResult::SmtResultInvalidHandle)?;
        Ok(Self {
            tag: handle.tag(),
            id,
        })
    }
}

// Limits and log level applied by every entry point, set through `smtLoadConfig`.
static CONFIG: RwLock<Option<BindingConfig>> = const_rwlock(None);

fn codec_limits() -> CodecLimits {
    CONFIG
        .read()
        .as_ref()
        .map(BindingConfig::codec_limits)
        .unwrap_or_default()
}

fn reader(model: &SmtModel) -> ValueReader<'_, Model> {
    let config = CONFIG.read();
    match config.as_ref() {
        Some(config) => model.0.reader_with(config),
        None => model.0.reader(),
    }
}

/// Copy `bytes` into a buffer from `libc::malloc`.
///
/// # Safety
/// - `pp_data` and `p_len` must be valid, non-null pointers.
unsafe fn export_bytes(bytes: &[u8], pp_data: *mut *mut u8, p_len: *mut usize) -> SmtResult {
    // malloc(0) may return null; always ask for at least one byte.
    let ptr = unsafe { libc::malloc(bytes.len().max(1)) } as *mut u8;
    if ptr.is_null() {
        return SmtResult::SmtResultOutOfMemory;
    }
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr, bytes.len());
        *pp_data = ptr;
        *p_len = bytes.len();
    }
    SmtResult::SmtResultSuccess
}

/// Borrow `len` elements at `ptr`; a null pointer is only valid when `len` is zero.
///
/// # Safety
/// - When non-null, `ptr` must point to `len` initialized elements.
unsafe fn import_slice<'a, T>(ptr: *const T, len: usize) -> Result<&'a [T], SmtResult> {
    if ptr.is_null() {
        return if len == 0 {
            Ok(&[])
        } else {
            Err(SmtResult::SmtResultInvalidPointer)
        };
    }
    Ok(unsafe { std::slice::from_raw_parts(ptr, len) })
}

unsafe fn import_handles(
    ptr: *const SmtValueHandle,
    len: u32,
) -> Result<Vec<ValueHandle>, SmtResult> {
    unsafe { import_slice(ptr, len as usize) }?
        .iter()
        .map(|h| h.to_handle())
        .collect()
}

/// Write `handles` into the caller array of `capacity` entries.
///
/// Nothing is written when the array is too short.
unsafe fn export_handles(
    handles: &[ValueHandle],
    p_out: *mut SmtValueHandle,
    capacity: u32,
) -> SmtResult {
    if (capacity as usize) < handles.len() {
        return SmtResult::SmtResultBufferTooSmall;
    }
    if p_out.is_null() && !handles.is_empty() {
        return SmtResult::SmtResultInvalidPointer;
    }
    let converted: Result<Vec<_>, _> = handles
        .iter()
        .map(|&h| SmtValueHandle::from_handle(h))
        .collect();
    let converted = match converted {
        Ok(converted) => converted,
        Err(err) => return err,
    };
    if !converted.is_empty() {
        unsafe { std::ptr::copy_nonoverlapping(converted.as_ptr(), p_out, converted.len()) };
    }
    SmtResult::SmtResultSuccess
}

macro_rules! check_ptr {
    ($($ptr:expr),+ $(,)?) => {
        if $($ptr.is_null())||+ {
            return SmtResult::SmtResultInvalidPointer;
        }
    };
}

macro_rules! try_smt {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(err) => return SmtResult::from(err),
        }
    };
}

// ----- library -----

/// Retrieves the version of the library.
///
/// # Safety
/// - The `pVersionInfo` pointer must be a valid, non-null pointer to a `SmtVersionInfo` struct.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtGetVersionInfo(p_version_info: *mut SmtVersionInfo) {
    if p_version_info.is_null() {
        return;
    }
    let (major, minor, patch) = match semver::Version::parse(env!("CARGO_PKG_VERSION")) {
        Ok(v) => (v.major as u16, v.minor as u16, v.patch as u16),
        Err(_) => (0, 0, 0),
    };

    unsafe {
        *p_version_info = SmtVersionInfo {
            major,
            minor,
            patch,
        };
    }
}

/// Install (or detach, with a null callback) the function receiving log records.
///
/// `level` is a `SmtLogLevelEXT` value.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtSetLogCallback(level: u32, callback: Option<SmtLogCallback_PFN>) -> SmtResult {
    let Some(level) = SmtLogLevelEXT::from_repr(level) else {
        return SmtResult::SmtResultInvalidTag;
    };
    if log_ext::install(level, callback) {
        SmtResult::SmtResultSuccess
    } else {
        SmtResult::SmtResultLoggerAlreadySet
    }
}

/// Load a TOML configuration file and apply it to every later call.
///
/// # Safety
/// - `pPath` must be a valid, NUL-terminated string.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtLoadConfig(p_path: *const c_char) -> SmtResult {
    check_ptr!(p_path);
    let path = match unsafe { CStr::from_ptr(p_path) }.to_str() {
        Ok(path) => path,
        Err(_) => return SmtResult::SmtResultUtf8Error,
    };
    let config = try_smt!(BindingConfig::from_file(path));
    log_ext::set_level(config.log.level.into());
    *CONFIG.write() = Some(config);
    SmtResult::SmtResultSuccess
}

/// Free a buffer returned by this library.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtFreeBuffer(ptr: *mut c_void) {
    if ptr.is_null() {
        return;
    }
    unsafe { libc::free(ptr) };
}

// ----- codec -----

/// Encode a sign and an unsigned big-endian magnitude into canonical bytes.
///
/// # Safety
/// - `pMagnitude` must point to `magnitudeLen` bytes (it may be null when the length is zero).
/// - `ppData` and `pDataLen` must be valid, non-null pointers. The buffer stored in
///   `*ppData` must be released with `smtFreeBuffer`.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtEncodeBignum(
    sign: i32,
    p_magnitude: *const u8,
    magnitude_len: usize,
    pp_data: *mut *mut u8,
    p_data_len: *mut usize,
) -> SmtResult {
    check_ptr!(pp_data, p_data_len);
    let magnitude = try_smt!(unsafe { import_slice(p_magnitude, magnitude_len) });
    let value = try_smt!(SignMagnitude::from_signum(sign, BigUint::from_bytes_be(magnitude)));
    let limits = codec_limits();
    let bytes = try_smt!(smtnum::encode_bignum_with(value.sign(), value.magnitude(), &limits));
    unsafe { export_bytes(&bytes, pp_data, p_data_len) }
}

/// Decode canonical bytes into a sign (-1, 0, 1) and an unsigned big-endian magnitude.
///
/// # Safety
/// - `pData` must point to `dataLen` bytes.
/// - Every output pointer must be valid and non-null. The magnitude buffer must be
///   released with `smtFreeBuffer`.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtDecodeBignum(
    p_data: *const u8,
    data_len: usize,
    p_sign: *mut i32,
    pp_magnitude: *mut *mut u8,
    p_magnitude_len: *mut usize,
) -> SmtResult {
    check_ptr!(p_sign, pp_magnitude, p_magnitude_len);
    let bytes = try_smt!(unsafe { import_slice(p_data, data_len) });
    let value = try_smt!(smtnum::decode_bignum_with(bytes, &codec_limits()));
    let magnitude = value.magnitude().to_bytes_be();
    let result = unsafe { export_bytes(&magnitude, pp_magnitude, p_magnitude_len) };
    if result == SmtResult::SmtResultSuccess {
        unsafe { *p_sign = value.signum() };
    }
    result
}

/// Parse `"n"` or `"n/d"` and encode its canonical numerator and denominator.
///
/// # Safety
/// - `pText` must be a valid, NUL-terminated string.
/// - Every output pointer must be valid and non-null. Both buffers must be released
///   with `smtFreeBuffer`.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtEncodeRational(
    p_text: *const c_char,
    pp_numerator: *mut *mut u8,
    p_numerator_len: *mut usize,
    pp_denominator: *mut *mut u8,
    p_denominator_len: *mut usize,
) -> SmtResult {
    check_ptr!(p_text, pp_numerator, p_numerator_len, pp_denominator, p_denominator_len);
    let text = match unsafe { CStr::from_ptr(p_text) }.to_str() {
        Ok(text) => text,
        Err(_) => return SmtResult::SmtResultUtf8Error,
    };
    let value = try_smt!(smtnum::parse_rational(text));
    let bytes = try_smt!(smtnum::encode_rational_with(&value, &codec_limits()));
    unsafe {
        export_rational(
            &bytes,
            pp_numerator,
            p_numerator_len,
            pp_denominator,
            p_denominator_len,
        )
    }
}

/// Decode a numerator/denominator pair into canonical `"n/d"` text (`"n"` for integers).
///
/// # Safety
/// - `pNumerator` and `pDenominator` must point to their respective lengths in bytes.
/// - `ppText` must be valid and non-null. The string must be released with `smtFreeBuffer`.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtDecodeRational(
    p_numerator: *const u8,
    numerator_len: usize,
    p_denominator: *const u8,
    denominator_len: usize,
    pp_text: *mut *mut c_char,
) -> SmtResult {
    check_ptr!(pp_text);
    let numerator = try_smt!(unsafe { import_slice(p_numerator, numerator_len) });
    let denominator = try_smt!(unsafe { import_slice(p_denominator, denominator_len) });
    let value = try_smt!(smtnum::decode_rational_with(numerator, denominator, &codec_limits()));

    let mut text = value.to_string().into_bytes();
    text.push(0);
    let mut len = 0usize;
    unsafe { export_bytes(&text, pp_text as *mut *mut u8, &mut len) }
}

unsafe fn export_rational(
    bytes: &smtnum::RationalBytes,
    pp_numerator: *mut *mut u8,
    p_numerator_len: *mut usize,
    pp_denominator: *mut *mut u8,
    p_denominator_len: *mut usize,
) -> SmtResult {
    let mut num_ptr = std::ptr::null_mut();
    let mut num_len = 0usize;
    let result = unsafe { export_bytes(&bytes.numerator, &mut num_ptr, &mut num_len) };
    if result != SmtResult::SmtResultSuccess {
        return result;
    }
    let result = unsafe { export_bytes(&bytes.denominator, pp_denominator, p_denominator_len) };
    if result != SmtResult::SmtResultSuccess {
        unsafe { libc::free(num_ptr as *mut c_void) };
        return result;
    }
    unsafe {
        *pp_numerator = num_ptr;
        *p_numerator_len = num_len;
    }
    SmtResult::SmtResultSuccess
}

// ----- model construction -----

/// Create an empty model builder.
///
/// # Safety
/// - `ppBuilder` must be a valid, non-null pointer.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtModelBuilderCreate(pp_builder: *mut *mut SmtModelBuilder) -> SmtResult {
    check_ptr!(pp_builder);
    let boxed = Box::new(SmtModelBuilder(ModelBuilder::new()));
    unsafe { *pp_builder = Box::into_raw(boxed) };
    SmtResult::SmtResultSuccess
}

/// Destroy a builder that was not finished.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtModelBuilderDestroy(builder: *mut SmtModelBuilder) {
    if builder.is_null() {
        return;
    }
    unsafe { drop(Box::from_raw(builder)) };
}

/// Run `add` on the builder and store the new handle in `pHandle`.
fn builder_add(
    builder: *mut SmtModelBuilder,
    p_handle: *mut SmtValueHandle,
    add: impl FnOnce(&mut ModelBuilder) -> Result<ValueHandle, SmtResult>,
) -> SmtResult {
    check_ptr!(builder, p_handle);
    let builder = unsafe { &mut *builder };
    let handle = try_smt!(add(&mut builder.0));
    let handle = try_smt!(SmtValueHandle::from_handle(handle));
    unsafe { *p_handle = handle };
    SmtResult::SmtResultSuccess
}

///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtModelBuilderAddUnknown(
    builder: *mut SmtModelBuilder,
    p_handle: *mut SmtValueHandle,
) -> SmtResult {
    builder_add(builder, p_handle, |b| Ok(b.add_unknown()?))
}

///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtModelBuilderAddBool(
    builder: *mut SmtModelBuilder,
    value: bool,
    p_handle: *mut SmtValueHandle,
) -> SmtResult {
    builder_add(builder, p_handle, |b| Ok(b.add_bool(value)?))
}

/// Add an integer given in canonical bytes.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtModelBuilderAddInteger(
    builder: *mut SmtModelBuilder,
    p_data: *const u8,
    data_len: usize,
    p_handle: *mut SmtValueHandle,
) -> SmtResult {
    builder_add(builder, p_handle, |b| {
        let bytes = unsafe { import_slice(p_data, data_len) }?;
        let value = smtnum::decode_integer_with(bytes, &codec_limits()).map_err(SmtResult::from)?;
        Ok(b.add_integer(value)?)
    })
}

/// Add a rational given as canonical numerator and denominator bytes.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtModelBuilderAddRational(
    builder: *mut SmtModelBuilder,
    p_numerator: *const u8,
    numerator_len: usize,
    p_denominator: *const u8,
    denominator_len: usize,
    p_handle: *mut SmtValueHandle,
) -> SmtResult {
    builder_add(builder, p_handle, |b| {
        let numerator = unsafe { import_slice(p_numerator, numerator_len) }?;
        let denominator = unsafe { import_slice(p_denominator, denominator_len) }?;
        let value = smtnum::decode_rational_with(numerator, denominator, &codec_limits())
            .map_err(SmtResult::from)?;
        Ok(b.add_rational(value)?)
    })
}

/// Add a bitvector of `bitCount` bits, least significant first.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtModelBuilderAddBitvector(
    builder: *mut SmtModelBuilder,
    p_bits: *const bool,
    bit_count: u32,
    p_handle: *mut SmtValueHandle,
) -> SmtResult {
    builder_add(builder, p_handle, |b| {
        let bits = unsafe { import_slice(p_bits, bit_count as usize) }?;
        Ok(b.add_bitvector(bits.iter().copied())?)
    })
}

///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtModelBuilderAddScalar(
    builder: *mut SmtModelBuilder,
    index: i32,
    type_id: i32,
    p_handle: *mut SmtValueHandle,
) -> SmtResult {
    builder_add(builder, p_handle, |b| Ok(b.add_scalar(index, type_id)?))
}

///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtModelBuilderAddTuple(
    builder: *mut SmtModelBuilder,
    p_children: *const SmtValueHandle,
    child_count: u32,
    p_handle: *mut SmtValueHandle,
) -> SmtResult {
    builder_add(builder, p_handle, |b| {
        let children = unsafe { import_handles(p_children, child_count) }?;
        Ok(b.add_tuple(&children)?)
    })
}

///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtModelBuilderAddMapping(
    builder: *mut SmtModelBuilder,
    p_args: *const SmtValueHandle,
    arg_count: u32,
    result: SmtValueHandle,
    p_handle: *mut SmtValueHandle,
) -> SmtResult {
    builder_add(builder, p_handle, |b| {
        let args = unsafe { import_handles(p_args, arg_count) }?;
        Ok(b.add_mapping(&args, result.to_handle()?)?)
    })
}

/// Add a function of type `typeId` with `arity` arguments. Every mapping must have
/// exactly `arity` arguments.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtModelBuilderAddFunction(
    builder: *mut SmtModelBuilder,
    type_id: i32,
    arity: u32,
    default_value: SmtValueHandle,
    p_mappings: *const SmtValueHandle,
    mapping_count: u32,
    p_handle: *mut SmtValueHandle,
) -> SmtResult {
    builder_add(builder, p_handle, |b| {
        let mappings = unsafe { import_handles(p_mappings, mapping_count) }?;
        Ok(b.add_function(type_id, arity, default_value.to_handle()?, &mappings)?)
    })
}

/// Give `term` the value `value`.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtModelBuilderAssign(
    builder: *mut SmtModelBuilder,
    term: i32,
    value: SmtValueHandle,
) -> SmtResult {
    check_ptr!(builder);
    let builder = unsafe { &mut *builder };
    let value = try_smt!(value.to_handle());
    try_smt!(builder.0.assign(term, value));
    SmtResult::SmtResultSuccess
}

/// Consume the builder and produce a model. The builder pointer is invalid afterwards,
/// whatever the result.
///
/// # Safety
/// - `builder` must come from `smtModelBuilderCreate`.
/// - `ppModel` must be a valid, non-null pointer. The model must be released with `smtFreeModel`.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtModelBuilderFinish(
    builder: *mut SmtModelBuilder,
    pp_model: *mut *mut SmtModel,
) -> SmtResult {
    if builder.is_null() {
        return SmtResult::SmtResultInvalidPointer;
    }
    let builder = unsafe { Box::from_raw(builder) };
    check_ptr!(pp_model);
    let boxed = Box::new(SmtModel(builder.0.build()));
    unsafe { *pp_model = Box::into_raw(boxed) };
    SmtResult::SmtResultSuccess
}

/// Release a model. Every handle taken from it becomes meaningless.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtFreeModel(model: *mut SmtModel) {
    if model.is_null() {
        return;
    }
    unsafe { drop(Box::from_raw(model)) };
}

// ----- value protocol -----

/// Run `read` against the model and its handle.
fn with_value<T>(
    model: *const SmtModel,
    handle: SmtValueHandle,
    p_out: *mut T,
    read: impl FnOnce(ValueReader<'_, Model>, ValueHandle) -> Result<T, SmtResult>,
) -> SmtResult {
    check_ptr!(model, p_out);
    let model = unsafe { &*model };
    let handle = try_smt!(handle.to_handle());
    let value = try_smt!(read(reader(model), handle));
    unsafe { *p_out = value };
    SmtResult::SmtResultSuccess
}

/// Handle of the value of `term`.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtGetValue(
    model: *const SmtModel,
    term: i32,
    p_handle: *mut SmtValueHandle,
) -> SmtResult {
    check_ptr!(model, p_handle);
    let model = unsafe { &*model };
    let handle = try_smt!(reader(model).get_value(term));
    let handle = try_smt!(SmtValueHandle::from_handle(handle));
    unsafe { *p_handle = handle };
    SmtResult::SmtResultSuccess
}

/// Validate the tag of `handle` and store it in `pTag`.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtGetKind(handle: SmtValueHandle, p_tag: *mut i32) -> SmtResult {
    check_ptr!(p_tag);
    let kind = try_smt!(smtmodel::get_kind(handle.tag));
    unsafe { *p_tag = kind.tag() };
    SmtResult::SmtResultSuccess
}

///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtValGetBool(
    model: *const SmtModel,
    handle: SmtValueHandle,
    p_value: *mut bool,
) -> SmtResult {
    with_value(model, handle, p_value, |r, h| Ok(r.decode_bool(h)?))
}

///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtValGetInt64(
    model: *const SmtModel,
    handle: SmtValueHandle,
    p_value: *mut i64,
) -> SmtResult {
    with_value(model, handle, p_value, |r, h| Ok(r.decode_int64(h)?))
}

///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtValGetDouble(
    model: *const SmtModel,
    handle: SmtValueHandle,
    p_value: *mut f64,
) -> SmtResult {
    with_value(model, handle, p_value, |r, h| Ok(r.decode_double(h)?))
}

/// Exact value of an arithmetic leaf as canonical numerator and denominator bytes.
///
/// # Safety
/// - Every output pointer must be valid and non-null. Both buffers must be released
///   with `smtFreeBuffer`.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtValGetRationalBytes(
    model: *const SmtModel,
    handle: SmtValueHandle,
    pp_numerator: *mut *mut u8,
    p_numerator_len: *mut usize,
    pp_denominator: *mut *mut u8,
    p_denominator_len: *mut usize,
) -> SmtResult {
    check_ptr!(model, pp_numerator, p_numerator_len, pp_denominator, p_denominator_len);
    let model = unsafe { &*model };
    let handle = try_smt!(handle.to_handle());
    let bytes = try_smt!(reader(model).decode_exact(handle));
    unsafe {
        export_rational(
            &bytes,
            pp_numerator,
            p_numerator_len,
            pp_denominator,
            p_denominator_len,
        )
    }
}

/// Bits of a bitvector, least significant first.
///
/// On success `*pBitCount` receives the size of the bitvector. `pBits` may be null to
/// only query the size; otherwise it must hold `capacity` entries and is left untouched
/// when too short.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtValGetBits(
    model: *const SmtModel,
    handle: SmtValueHandle,
    p_bits: *mut bool,
    capacity: u32,
    p_bit_count: *mut u32,
) -> SmtResult {
    check_ptr!(model, p_bit_count);
    let model = unsafe { &*model };
    let handle = try_smt!(handle.to_handle());
    let r = reader(model);
    let size = try_smt!(r.bit_size(handle));
    if !p_bits.is_null() {
        let out = unsafe { std::slice::from_raw_parts_mut(p_bits, capacity as usize) };
        try_smt!(r.decode_bits_into(handle, out));
    }
    unsafe { *p_bit_count = size };
    SmtResult::SmtResultSuccess
}

///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtValGetScalar(
    model: *const SmtModel,
    handle: SmtValueHandle,
    p_index: *mut i32,
    p_type_id: *mut i32,
) -> SmtResult {
    check_ptr!(p_type_id);
    let mut type_id = 0;
    let result = with_value(model, handle, p_index, |r, h| {
        let (index, ty) = r.decode_scalar(h)?;
        type_id = ty;
        Ok(index)
    });
    if result == SmtResult::SmtResultSuccess {
        unsafe { *p_type_id = type_id };
    }
    result
}

///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtValTupleArity(
    model: *const SmtModel,
    handle: SmtValueHandle,
    p_arity: *mut u32,
) -> SmtResult {
    with_value(model, handle, p_arity, |r, h| Ok(r.tuple_arity(h)?))
}

/// Write the components of a tuple into `pChildren`, which holds `capacity` entries.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtValExpandTuple(
    model: *const SmtModel,
    handle: SmtValueHandle,
    p_children: *mut SmtValueHandle,
    capacity: u32,
) -> SmtResult {
    check_ptr!(model);
    let model = unsafe { &*model };
    let handle = try_smt!(handle.to_handle());
    let children = try_smt!(reader(model).expand_tuple(handle));
    unsafe { export_handles(&children, p_children, capacity) }
}

///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtValFunctionArity(
    model: *const SmtModel,
    handle: SmtValueHandle,
    p_arity: *mut u32,
) -> SmtResult {
    with_value(model, handle, p_arity, |r, h| Ok(r.function_arity(h)?))
}

/// Number of point mappings of a function, excluding its default.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtValFunctionCardinality(
    model: *const SmtModel,
    handle: SmtValueHandle,
    p_cardinality: *mut u32,
) -> SmtResult {
    with_value(model, handle, p_cardinality, |r, h| Ok(r.function_cardinality(h)?))
}

/// Write the mapping handles of a function into `pMappings` and its default into `pDefault`.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtValExpandFunction(
    model: *const SmtModel,
    handle: SmtValueHandle,
    p_mappings: *mut SmtValueHandle,
    capacity: u32,
    p_default: *mut SmtValueHandle,
) -> SmtResult {
    check_ptr!(model, p_default);
    let model = unsafe { &*model };
    let handle = try_smt!(handle.to_handle());
    let expansion = try_smt!(reader(model).expand_function(handle));
    let default = try_smt!(SmtValueHandle::from_handle(expansion.default));
    let result = unsafe { export_handles(&expansion.mappings, p_mappings, capacity) };
    if result == SmtResult::SmtResultSuccess {
        unsafe { *p_default = default };
    }
    result
}

///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtValMappingArity(
    model: *const SmtModel,
    handle: SmtValueHandle,
    p_arity: *mut u32,
) -> SmtResult {
    with_value(model, handle, p_arity, |r, h| Ok(r.mapping_arity(h)?))
}

/// Write the arguments of a mapping into `pArgs` and its result into `pResult`.
///cbindgen:rename-all=CamelCase
#[no_mangle]
pub extern "C" fn smtValExpandMapping(
    model: *const SmtModel,
    handle: SmtValueHandle,
    p_args: *mut SmtValueHandle,
    capacity: u32,
    p_result: *mut SmtValueHandle,
) -> SmtResult {
    check_ptr!(model, p_result);
    let model = unsafe { &*model };
    let handle = try_smt!(handle.to_handle());
    let expansion = try_smt!(reader(model).expand_mapping(handle));
    let value = try_smt!(SmtValueHandle::from_handle(expansion.result));
    let result = unsafe { export_handles(&expansion.args, p_args, capacity) };
    if result == SmtResult::SmtResultSuccess {
        unsafe { *p_result = value };
    }
    result
}

#[cfg(test)]
mod tests {
    use std::ptr::{null, null_mut};

    use super::*;

    fn handle() -> SmtValueHandle {
        SmtValueHandle { tag: 0, id: 0 }
    }

    unsafe fn take_bytes(ptr: *mut u8, len: usize) -> Vec<u8> {
        let bytes = unsafe { std::slice::from_raw_parts(ptr, len) }.to_vec();
        smtFreeBuffer(ptr as *mut c_void);
        bytes
    }

    /// Builds x = 300, p = (false, #b01), f = { true -> -1, else 7 } over terms 0, 1, 2.
    fn sample_model() -> *mut SmtModel {
        let mut builder = null_mut();
        assert_eq!(smtModelBuilderCreate(&mut builder), SmtResult::SmtResultSuccess);

        let three_hundred = [0x01u8, 0x2C];
        let mut x = handle();
        assert_eq!(
            smtModelBuilderAddInteger(builder, three_hundred.as_ptr(), 2, &mut x),
            SmtResult::SmtResultSuccess
        );

        let mut f_bit = handle();
        smtModelBuilderAddBool(builder, false, &mut f_bit);
        let bits = [true, false];
        let mut bv = handle();
        smtModelBuilderAddBitvector(builder, bits.as_ptr(), 2, &mut bv);
        let mut p = handle();
        let children = [f_bit, bv];
        assert_eq!(
            smtModelBuilderAddTuple(builder, children.as_ptr(), 2, &mut p),
            SmtResult::SmtResultSuccess
        );

        let mut t = handle();
        smtModelBuilderAddBool(builder, true, &mut t);
        let mut minus_one = handle();
        smtModelBuilderAddInteger(builder, [0xFFu8].as_ptr(), 1, &mut minus_one);
        let mut seven = handle();
        smtModelBuilderAddInteger(builder, [0x07u8].as_ptr(), 1, &mut seven);
        let mut point = handle();
        assert_eq!(
            smtModelBuilderAddMapping(builder, &t, 1, minus_one, &mut point),
            SmtResult::SmtResultSuccess
        );
        let mut f = handle();
        assert_eq!(
            smtModelBuilderAddFunction(builder, 4, 1, seven, &point, 1, &mut f),
            SmtResult::SmtResultSuccess
        );

        for (term, value) in [(0, x), (1, p), (2, f)] {
            assert_eq!(smtModelBuilderAssign(builder, term, value), SmtResult::SmtResultSuccess);
        }

        let mut model = null_mut();
        assert_eq!(smtModelBuilderFinish(builder, &mut model), SmtResult::SmtResultSuccess);
        model
    }

    #[test]
    fn version_matches_package() {
        let mut info = SmtVersionInfo {
            major: 99,
            minor: 99,
            patch: 99,
        };
        smtGetVersionInfo(&mut info);
        let version = semver::Version::parse(env!("CARGO_PKG_VERSION")).unwrap();
        assert_eq!(info.major as u64, version.major);
        assert_eq!(info.minor as u64, version.minor);
        assert_eq!(info.patch as u64, version.patch);
    }

    #[test]
    fn bignum_codec_through_c() {
        let magnitude = [0x01u8, 0x00];
        let mut data = null_mut();
        let mut len = 0;
        assert_eq!(
            smtEncodeBignum(-1, magnitude.as_ptr(), 2, &mut data, &mut len),
            SmtResult::SmtResultSuccess
        );
        let bytes = unsafe { take_bytes(data, len) };
        assert_eq!(bytes, vec![0xFF, 0x00]);

        let mut sign = 7;
        let mut mag = null_mut();
        let mut mag_len = 0;
        assert_eq!(
            smtDecodeBignum(bytes.as_ptr(), bytes.len(), &mut sign, &mut mag, &mut mag_len),
            SmtResult::SmtResultSuccess
        );
        assert_eq!(sign, -1);
        assert_eq!(unsafe { take_bytes(mag, mag_len) }, vec![0x01, 0x00]);

        assert_eq!(
            smtEncodeBignum(0, magnitude.as_ptr(), 2, &mut data, &mut len),
            SmtResult::SmtResultSignMismatch
        );
        assert_eq!(
            smtDecodeBignum(null(), 0, &mut sign, &mut mag, &mut mag_len),
            SmtResult::SmtResultEmptyInput
        );
    }

    #[test]
    fn rational_text_roundtrip() {
        let text = c"6/-4";
        let (mut num, mut num_len, mut den, mut den_len) = (null_mut(), 0, null_mut(), 0);
        assert_eq!(
            smtEncodeRational(text.as_ptr(), &mut num, &mut num_len, &mut den, &mut den_len),
            SmtResult::SmtResultSuccess
        );
        let num = unsafe { take_bytes(num, num_len) };
        let den = unsafe { take_bytes(den, den_len) };
        assert_eq!((num.as_slice(), den.as_slice()), (&[0xFDu8][..], &[0x02u8][..]));

        let mut out = null_mut();
        assert_eq!(
            smtDecodeRational(num.as_ptr(), num.len(), den.as_ptr(), den.len(), &mut out),
            SmtResult::SmtResultSuccess
        );
        let decoded = unsafe { CStr::from_ptr(out) }.to_str().unwrap().to_owned();
        smtFreeBuffer(out as *mut c_void);
        assert_eq!(decoded, "-3/2");

        let zero = [0u8];
        assert_eq!(
            smtDecodeRational(num.as_ptr(), 1, zero.as_ptr(), 1, &mut out),
            SmtResult::SmtResultZeroDenominator
        );
    }

    #[test]
    fn leaves_are_decoded() {
        let model = sample_model();

        let mut x = handle();
        assert_eq!(smtGetValue(model, 0, &mut x), SmtResult::SmtResultSuccess);
        let mut tag = -1;
        assert_eq!(smtGetKind(x, &mut tag), SmtResult::SmtResultSuccess);
        assert_eq!(tag, ValueKind::Rational.tag());

        let mut value = 0i64;
        assert_eq!(smtValGetInt64(model, x, &mut value), SmtResult::SmtResultSuccess);
        assert_eq!(value, 300);
        let mut d = 0.0;
        assert_eq!(smtValGetDouble(model, x, &mut d), SmtResult::SmtResultSuccess);
        assert_eq!(d, 300.0);

        let (mut num, mut num_len, mut den, mut den_len) = (null_mut(), 0, null_mut(), 0);
        assert_eq!(
            smtValGetRationalBytes(model, x, &mut num, &mut num_len, &mut den, &mut den_len),
            SmtResult::SmtResultSuccess
        );
        assert_eq!(unsafe { take_bytes(num, num_len) }, vec![0x01, 0x2C]);
        assert_eq!(unsafe { take_bytes(den, den_len) }, vec![0x01]);

        let mut b = true;
        assert_eq!(smtValGetBool(model, x, &mut b), SmtResult::SmtResultKindMismatch);
        assert!(b);

        smtFreeModel(model);
    }

    #[test]
    fn composites_expand_one_level() {
        let model = sample_model();

        let mut p = handle();
        smtGetValue(model, 1, &mut p);
        let mut arity = 0;
        assert_eq!(smtValTupleArity(model, p, &mut arity), SmtResult::SmtResultSuccess);
        assert_eq!(arity, 2);

        let sentinel = SmtValueHandle { tag: 4, id: 999 };
        let mut short = [sentinel; 1];
        assert_eq!(
            smtValExpandTuple(model, p, short.as_mut_ptr(), 1),
            SmtResult::SmtResultBufferTooSmall
        );
        assert_eq!(short, [sentinel]);

        let mut children = [sentinel; 2];
        assert_eq!(
            smtValExpandTuple(model, p, children.as_mut_ptr(), 2),
            SmtResult::SmtResultSuccess
        );
        assert_eq!(children[1].kind(), Some(ValueKind::Bitvector));

        let mut size = 0;
        assert_eq!(
            smtValGetBits(model, children[1], null_mut(), 0, &mut size),
            SmtResult::SmtResultSuccess
        );
        assert_eq!(size, 2);
        let mut bits = [false; 2];
        smtValGetBits(model, children[1], bits.as_mut_ptr(), 2, &mut size);
        assert_eq!(bits, [true, false]);

        let mut f = handle();
        smtGetValue(model, 2, &mut f);
        let mut card = 0;
        assert_eq!(smtValFunctionCardinality(model, f, &mut card), SmtResult::SmtResultSuccess);
        assert_eq!(card, 1);
        let mut fn_arity = 0;
        smtValFunctionArity(model, f, &mut fn_arity);
        assert_eq!(fn_arity, 1);

        let mut mappings = [sentinel; 1];
        let mut default = handle();
        assert_eq!(
            smtValExpandFunction(model, f, mappings.as_mut_ptr(), 1, &mut default),
            SmtResult::SmtResultSuccess
        );
        let mut seven = 0i64;
        smtValGetInt64(model, default, &mut seven);
        assert_eq!(seven, 7);

        let mut args = [sentinel; 1];
        let mut result = handle();
        assert_eq!(
            smtValExpandMapping(model, mappings[0], args.as_mut_ptr(), 1, &mut result),
            SmtResult::SmtResultSuccess
        );
        let mut arg = false;
        smtValGetBool(model, args[0], &mut arg);
        assert!(arg);
        let mut minus_one = 0i64;
        smtValGetInt64(model, result, &mut minus_one);
        assert_eq!(minus_one, -1);

        smtFreeModel(model);
    }

    #[test]
    fn invalid_inputs_are_reported() {
        let model = sample_model();
        let mut out = handle();
        assert_eq!(smtGetValue(model, 42, &mut out), SmtResult::SmtResultUndefinedValue);
        assert_eq!(smtGetValue(null(), 0, &mut out), SmtResult::SmtResultInvalidPointer);

        let mut tag = 0;
        assert_eq!(
            smtGetKind(SmtValueHandle { tag: 12, id: 0 }, &mut tag),
            SmtResult::SmtResultInvalidTag
        );
        let mut b = false;
        assert_eq!(
            smtValGetBool(model, SmtValueHandle { tag: 1, id: -1 }, &mut b),
            SmtResult::SmtResultInvalidHandle
        );
        assert_eq!(
            smtValGetBool(model, SmtValueHandle { tag: 1, id: 5000 }, &mut b),
            SmtResult::SmtResultInvalidHandle
        );
        smtFreeModel(model);

        let mut builder = null_mut();
        smtModelBuilderCreate(&mut builder);
        assert_eq!(
            smtModelBuilderAddTuple(builder, null(), 0, &mut out),
            SmtResult::SmtResultMalformedValue
        );
        assert_eq!(
            smtModelBuilderAddRational(builder, [1u8].as_ptr(), 1, [0u8].as_ptr(), 1, &mut out),
            SmtResult::SmtResultZeroDenominator
        );
        assert_eq!(
            smtModelBuilderAssign(builder, -1, out),
            SmtResult::SmtResultInvalidTerm
        );
        smtModelBuilderDestroy(builder);
    }

    #[test]
    fn missing_config_file_is_io_error() {
        let path = c"/nonexistent/smtmodel.toml";
        assert_eq!(smtLoadConfig(path.as_ptr()), SmtResult::SmtResultIoError);
        assert_eq!(smtLoadConfig(null()), SmtResult::SmtResultInvalidPointer);
        assert_eq!(smtSetLogCallback(17, None), SmtResult::SmtResultInvalidTag);
    }
}
