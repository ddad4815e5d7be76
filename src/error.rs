//! Errors surfaced by the data-fetch layer.

use thiserror::Error;

/// Failure loading graph data from the backend.
#[derive(Debug, Error)]
pub enum Error {
	#[error("request to {url} failed: {source}")]
	Http {
		url: String,
		#[source]
		source: reqwest::Error,
	},

	#[error("{url} responded with HTTP {status}")]
	Status { url: String, status: u16 },

	#[error("could not decode response from {url}: {source}")]
	Decode {
		url: String,
		#[source]
		source: serde_json::Error,
	},
}

pub type Result<T> = std::result::Result<T, Error>;
