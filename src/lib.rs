//! Client-side bearer token steward: keeps a short-lived access token in memory, refreshes it
//! ahead of expiry through an ambient (cookie-held) refresh credential, coalesces concurrent
//! refreshes into one network call, and retries authenticated requests once after a 401.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod config;
pub mod error;
pub mod http;
pub mod manager;
pub mod obs;
pub mod token;

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use ::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};

pub use crate::{
	config::{ManagerConfig, RefreshMethod, TokenExtractor},
	error::{Error, Result},
	manager::TokenManager,
	token::{Token, TokenSecret},
};
