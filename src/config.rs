//! Runtime settings for the graph page.

use crate::graph::{Direction, NodeSize};

const DEFAULT_API_BASE_URL: &str = "/api";
const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Page configuration, provided to the component tree through context.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
	/// Backend root, without a trailing slash.
	pub api_base_url: String,
	/// Objects requested per graph refresh.
	pub page_size: u32,
	pub direction: Direction,
	pub node_size: NodeSize,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			api_base_url: DEFAULT_API_BASE_URL.into(),
			page_size: DEFAULT_PAGE_SIZE,
			direction: Direction::LeftRight,
			node_size: NodeSize::default(),
		}
	}
}

impl Config {
	/// Defaults, overridable at build time through `RELATION_GRAPH_API_URL`
	/// and `RELATION_GRAPH_DIRECTION` (`LR` or `TB`).
	pub fn from_build_env() -> Self {
		Self::default()
			.with_api_base_url(option_env!("RELATION_GRAPH_API_URL"))
			.with_direction(option_env!("RELATION_GRAPH_DIRECTION"))
	}

	fn with_api_base_url(mut self, url: Option<&str>) -> Self {
		if let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) {
			self.api_base_url = url.trim_end_matches('/').to_owned();
		}
		self
	}

	fn with_direction(mut self, direction: Option<&str>) -> Self {
		if let Some(Ok(direction)) = direction.map(str::parse) {
			self.direction = direction;
		}
		self
	}
}
