use std::{ffi::CString, os::raw::c_void, ptr::null_mut};

use smtmodel_cffi::*;

fn load_limit(max_encoded_len: usize) {
    let path = std::env::temp_dir().join(format!(
        "smtmodel-codec-limits-{}.toml",
        std::process::id()
    ));
    std::fs::write(&path, format!("[codec]\nmax_encoded_len = {max_encoded_len}\n")).unwrap();
    let c_path = CString::new(path.to_str().unwrap()).unwrap();
    assert_eq!(smtLoadConfig(c_path.as_ptr()), SmtResult::SmtResultSuccess);
    let _ = std::fs::remove_file(&path);
}

// Config is process-global, so every check against the loaded limit lives in one test.
#[test]
fn loaded_limit_bounds_both_directions() {
    load_limit(2);

    let mut data = null_mut();
    let mut len = 0;

    // 65536 needs three bytes plus the sign byte.
    let wide = [0x01u8, 0x00, 0x00];
    assert_eq!(
        smtEncodeBignum(1, wide.as_ptr(), wide.len(), &mut data, &mut len),
        SmtResult::SmtResultOutOfMemory
    );
    assert!(data.is_null());

    let narrow = [0x80u8];
    assert_eq!(
        smtEncodeBignum(1, narrow.as_ptr(), narrow.len(), &mut data, &mut len),
        SmtResult::SmtResultSuccess
    );
    let bytes = unsafe { std::slice::from_raw_parts(data, len) }.to_vec();
    smtFreeBuffer(data as *mut c_void);
    assert_eq!(bytes, vec![0x00, 0x80]);

    let mut sign = 7;
    let mut mag = null_mut();
    let mut mag_len = 0;
    let long_input = [0x01u8, 0x00, 0x00];
    assert_eq!(
        smtDecodeBignum(long_input.as_ptr(), 3, &mut sign, &mut mag, &mut mag_len),
        SmtResult::SmtResultOutOfMemory
    );
    assert_eq!(sign, 7);
    assert!(mag.is_null());

    assert_eq!(
        smtDecodeBignum(bytes.as_ptr(), bytes.len(), &mut sign, &mut mag, &mut mag_len),
        SmtResult::SmtResultSuccess
    );
    assert_eq!(sign, 1);
    smtFreeBuffer(mag as *mut c_void);

    let text = CString::new("65536/3").unwrap();
    let (mut num, mut num_len, mut den, mut den_len) = (null_mut(), 0, null_mut(), 0);
    assert_eq!(
        smtEncodeRational(text.as_ptr(), &mut num, &mut num_len, &mut den, &mut den_len),
        SmtResult::SmtResultOutOfMemory
    );

    let one = [0x01u8];
    let mut rendered = null_mut();
    assert_eq!(
        smtDecodeRational(long_input.as_ptr(), 3, one.as_ptr(), 1, &mut rendered),
        SmtResult::SmtResultOutOfMemory
    );
    assert_eq!(
        smtDecodeRational(one.as_ptr(), 1, long_input.as_ptr(), 3, &mut rendered),
        SmtResult::SmtResultOutOfMemory
    );
    assert!(rendered.is_null());

    let mut builder = null_mut();
    assert_eq!(smtModelBuilderCreate(&mut builder), SmtResult::SmtResultSuccess);
    let mut handle = SmtValueHandle { tag: 0, id: 0 };
    assert_eq!(
        smtModelBuilderAddInteger(builder, long_input.as_ptr(), 3, &mut handle),
        SmtResult::SmtResultOutOfMemory
    );
    assert_eq!(
        smtModelBuilderAddRational(builder, long_input.as_ptr(), 3, one.as_ptr(), 1, &mut handle),
        SmtResult::SmtResultOutOfMemory
    );
    assert_eq!(
        smtModelBuilderAddInteger(builder, bytes.as_ptr(), bytes.len(), &mut handle),
        SmtResult::SmtResultSuccess
    );
    assert_eq!(handle.kind(), Some(smtmodel::ValueKind::Rational));
    smtModelBuilderDestroy(builder);
}
