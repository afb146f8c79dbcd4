use error_stack::Context;

use super::{Error, Result};
use crate::types::ErrorKind;

pub trait StdContext<T> {
    fn change_kind(self, kind: ErrorKind) -> Result<T>;
    fn into_http_result(self) -> Result<T>;
}

pub trait ErrorStackContext<T> {
    fn change_kind(self, kind: ErrorKind) -> Result<T>;
    fn into_http_result(self) -> Result<T>;
}

impl<T, C: Context> StdContext<T> for std::result::Result<T, C> {
    fn change_kind(self, kind: ErrorKind) -> Result<T> {
        self.map_err(|e| Error::from_context(kind, e))
    }

    fn into_http_result(self) -> Result<T> {
        self.map_err(|e| Error::from_context(ErrorKind::Internal, e))
    }
}

impl<T, C: Context> ErrorStackContext<T> for error_stack::Result<T, C> {
    fn change_kind(self, kind: ErrorKind) -> Result<T> {
        self.map_err(|e| Error::from_report(kind, e))
    }

    fn into_http_result(self) -> Result<T> {
        self.map_err(|e| Error::from_report(ErrorKind::Internal, e))
    }
}
