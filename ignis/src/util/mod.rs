use std::ffi::{c_char, CStr, CString};

/// Utility functions commonly used
pub mod deletion_queue;
pub mod immediate_submit;

pub use deletion_queue::{DeletionQueue, ReleaseTicket};
pub use immediate_submit::{ImmediateSubmit, ImmediateSubmitContext};

#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub fn wrap_c_str(c: *const c_char) -> CString {
    if c.is_null() {
        CString::default()
    } else {
        unsafe { CString::new(CStr::from_ptr(c).to_bytes()).unwrap_or_default() }
    }
}
