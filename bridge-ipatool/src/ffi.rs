//! # Foreign Call Adapter
//!
//! Moves JSON requests across the C ABI exported by the ipatool engine and
//! brings the responses back.
//!
//! ## Boundary contract
//!
//! Every entry point takes a NUL-terminated UTF-8 request and returns a
//! NUL-terminated UTF-8 response allocated by the engine. The response must
//! be handed back to the engine's free routine exactly once; [`ForeignBuffer`]
//! owns it until then.
//!
//! Calls run on tokio's blocking pool. Dropping the awaiting future leaves the
//! call running to completion and the buffer is still released.

use bridge_traits::{BridgeError, Operation, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr::NonNull;
use tracing::{debug, trace};

use crate::envelope::{decode_response, encode_request};
use crate::wire::EngineVersion;

/// Request/response entry point exported by the engine.
pub type EntryPoint = unsafe extern "C" fn(*mut c_char) -> *mut c_char;

/// Routine that releases a response buffer.
pub type FreeString = unsafe extern "C" fn(*mut c_char);

/// Entry point reporting the engine build.
pub type VersionEntryPoint = unsafe extern "C" fn() -> *mut c_char;

/// Engine entry points, one per boundary operation.
#[derive(Clone, Copy)]
pub struct EntryPoints {
    pub search: EntryPoint,
    pub lookup: EntryPoint,
    pub fetch_bag: EntryPoint,
    pub authenticate: EntryPoint,
    pub purchase: EntryPoint,
    pub list_versions: EntryPoint,
    pub get_version_metadata: EntryPoint,
    pub download: EntryPoint,
    pub version: Option<VersionEntryPoint>,
    pub free_string: FreeString,
}

impl EntryPoints {
    /// Entry point serving `operation`.
    ///
    /// Password token rotation has none of its own; it is served through
    /// `authenticate`.
    pub fn entry_point(&self, operation: Operation) -> Option<EntryPoint> {
        match operation {
            Operation::Search => Some(self.search),
            Operation::Lookup => Some(self.lookup),
            Operation::FetchBag => Some(self.fetch_bag),
            Operation::Authenticate => Some(self.authenticate),
            Operation::RotatePasswordToken => None,
            Operation::Purchase => Some(self.purchase),
            Operation::ListVersions => Some(self.list_versions),
            Operation::GetVersionMetadata => Some(self.get_version_metadata),
            Operation::Download => Some(self.download),
        }
    }

    /// Entry points of the linked `GoIPAToolBindings` library.
    #[cfg(feature = "linked")]
    pub fn linked() -> Self {
        Self {
            search: linked::APGoIPAToolSearch,
            lookup: linked::APGoIPAToolLookup,
            fetch_bag: linked::APGoIPAToolFetchBag,
            authenticate: linked::APGoIPAToolAuthenticate,
            purchase: linked::APGoIPAToolPurchase,
            list_versions: linked::APGoIPAToolListVersions,
            get_version_metadata: linked::APGoIPAToolGetVersionMetadata,
            download: linked::APGoIPAToolDownload,
            version: Some(linked::APGoIPAToolVersion),
            free_string: linked::APGoIPAToolFreeString,
        }
    }
}

impl std::fmt::Debug for EntryPoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryPoints")
            .field("version", &self.version.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "linked")]
#[allow(non_snake_case)]
mod linked {
    use std::os::raw::c_char;

    #[link(name = "GoIPAToolBindings")]
    extern "C" {
        pub fn APGoIPAToolSearch(request: *mut c_char) -> *mut c_char;
        pub fn APGoIPAToolLookup(request: *mut c_char) -> *mut c_char;
        pub fn APGoIPAToolFetchBag(request: *mut c_char) -> *mut c_char;
        pub fn APGoIPAToolAuthenticate(request: *mut c_char) -> *mut c_char;
        pub fn APGoIPAToolPurchase(request: *mut c_char) -> *mut c_char;
        pub fn APGoIPAToolListVersions(request: *mut c_char) -> *mut c_char;
        pub fn APGoIPAToolGetVersionMetadata(request: *mut c_char) -> *mut c_char;
        pub fn APGoIPAToolDownload(request: *mut c_char) -> *mut c_char;
        pub fn APGoIPAToolVersion() -> *mut c_char;
        pub fn APGoIPAToolFreeString(value: *mut c_char);
    }
}

/// Engine-allocated response released on drop.
pub struct ForeignBuffer {
    ptr: NonNull<c_char>,
    free: FreeString,
}

impl ForeignBuffer {
    /// Take ownership of `ptr`. Returns `None` for a null pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a NUL-terminated buffer allocated by the engine
    /// that nothing else will free, and `free` must be the routine that
    /// releases it.
    pub unsafe fn from_raw(ptr: *mut c_char, free: FreeString) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr, free })
    }

    /// View the response as UTF-8 text.
    pub fn to_str(&self) -> Result<&str> {
        // SAFETY: `from_raw` guarantees a live NUL-terminated buffer.
        let bytes = unsafe { CStr::from_ptr(self.ptr.as_ptr()) };
        bytes.to_str().map_err(|e| {
            BridgeError::MalformedResponse(format!("backend response is not UTF-8: {}", e))
        })
    }
}

impl Drop for ForeignBuffer {
    fn drop(&mut self) {
        // SAFETY: the buffer is owned by this guard and released only here.
        unsafe { (self.free)(self.ptr.as_ptr()) }
    }
}

/// Calls engine entry points with typed requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForeignCallAdapter {
    entry_points: Option<EntryPoints>,
}

impl ForeignCallAdapter {
    pub fn new(entry_points: EntryPoints) -> Self {
        Self {
            entry_points: Some(entry_points),
        }
    }

    /// An adapter with no engine behind it. Every call is rejected.
    pub fn unlinked() -> Self {
        Self { entry_points: None }
    }

    /// The adapter for this build: the linked engine when compiled with the
    /// `linked` feature, otherwise [`unlinked`](Self::unlinked).
    pub fn from_link() -> Self {
        #[cfg(feature = "linked")]
        return Self::new(EntryPoints::linked());

        #[cfg(not(feature = "linked"))]
        return Self::unlinked();
    }

    pub fn is_linked(&self) -> bool {
        self.entry_points.is_some()
    }

    /// Whether a call for `operation` can reach the engine.
    pub fn supports(&self, operation: Operation) -> bool {
        match &self.entry_points {
            Some(entry_points) => {
                operation == Operation::RotatePasswordToken
                    || entry_points.entry_point(operation).is_some()
            }
            None => false,
        }
    }

    /// Call the engine synchronously.
    ///
    /// Blocks for the duration of the engine call; async callers use
    /// [`call`](Self::call).
    pub fn invoke<Req, Res>(&self, operation: Operation, request: &Req) -> Result<Res>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let entry_points = self.entry_points.ok_or_else(|| {
            BridgeError::BackendUnavailable("ipatool backend binary is not linked".to_string())
        })?;
        let entry_point = entry_points.entry_point(operation).ok_or_else(|| {
            BridgeError::BackendUnavailable(format!(
                "ipatool backend has no entry point for operation {}",
                operation
            ))
        })?;

        let payload = encode_request(request)?;
        let payload = CString::new(payload).map_err(|_| {
            BridgeError::InvalidRequest("request contains an interior NUL byte".to_string())
        })?;

        trace!(operation = %operation, "Calling engine entry point");
        let raw = payload.into_raw();
        // SAFETY: `raw` is a valid NUL-terminated buffer for the duration of
        // the call and is reclaimed below; the engine does not retain it.
        let response = unsafe { entry_point(raw) };
        // SAFETY: `raw` came from `CString::into_raw` above.
        drop(unsafe { CString::from_raw(raw) });

        // SAFETY: entry points return null or an engine-owned buffer.
        let buffer = unsafe { ForeignBuffer::from_raw(response, entry_points.free_string) }
            .ok_or_else(|| {
                BridgeError::MalformedResponse("backend returned empty response".to_string())
            })?;

        decode_response(operation, buffer.to_str()?)
    }

    /// Call the engine on the blocking pool.
    pub async fn call<Req, Res>(&self, operation: Operation, request: Req) -> Result<Res>
    where
        Req: Serialize + Send + 'static,
        Res: DeserializeOwned + Send + 'static,
    {
        let adapter = *self;
        let outcome = tokio::task::spawn_blocking(move || adapter.invoke(operation, &request))
            .await
            .map_err(|e| {
                BridgeError::BackendFailure(format!("engine call for {} did not complete: {}", operation, e))
            })?;

        if let Err(err) = &outcome {
            debug!(operation = %operation, error = %err, "Engine call failed");
        }
        outcome
    }

    /// Query the engine's module path and version.
    pub fn engine_version(&self) -> Result<EngineVersion> {
        let entry_points = self.entry_points.ok_or_else(|| {
            BridgeError::BackendUnavailable("ipatool backend binary is not linked".to_string())
        })?;
        let version = entry_points.version.ok_or_else(|| {
            BridgeError::BackendUnavailable("ipatool backend does not report a version".to_string())
        })?;

        // SAFETY: the version entry point takes no input and returns null or
        // an engine-owned buffer.
        let buffer = unsafe { ForeignBuffer::from_raw(version(), entry_points.free_string) }
            .ok_or_else(|| {
                BridgeError::MalformedResponse("backend returned empty response".to_string())
            })?;

        serde_json::from_str(buffer.to_str()?).map_err(|e| {
            BridgeError::MalformedResponse(format!("invalid engine version: {}", e))
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fake engines for exercising the adapter without the real library.

    use super::*;
    use std::cell::Cell;

    thread_local! {
        static FREED: Cell<usize> = const { Cell::new(0) };
    }

    /// Buffers released on the current thread so far.
    pub fn freed_on_this_thread() -> usize {
        FREED.with(Cell::get)
    }

    pub fn respond(text: &str) -> *mut c_char {
        CString::new(text).unwrap().into_raw()
    }

    pub unsafe fn request_text(request: *mut c_char) -> String {
        CStr::from_ptr(request).to_str().unwrap().to_string()
    }

    pub unsafe extern "C" fn counting_free(ptr: *mut c_char) {
        drop(CString::from_raw(ptr));
        FREED.with(|freed| freed.set(freed.get() + 1));
    }

    pub unsafe extern "C" fn unimplemented_entry(_request: *mut c_char) -> *mut c_char {
        respond(r#"{"ok":false,"error":"not implemented by fake engine"}"#)
    }

    /// Entry points that all fail, with `free_string` counting releases.
    pub fn entry_points() -> EntryPoints {
        EntryPoints {
            search: unimplemented_entry,
            lookup: unimplemented_entry,
            fetch_bag: unimplemented_entry,
            authenticate: unimplemented_entry,
            purchase: unimplemented_entry,
            list_versions: unimplemented_entry,
            get_version_metadata: unimplemented_entry,
            download: unimplemented_entry,
            version: None,
            free_string: counting_free,
        }
    }
}
