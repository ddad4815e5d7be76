//! API client for the knowledge-base backend.

use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::records::{Funnel, Object, ObjectType, Snapshot};

/// Object types are listed with the backend's maximum page size.
const OBJECT_TYPE_PAGE_SIZE: u32 = 100;

#[derive(Debug, Default, Deserialize)]
struct ObjectPage {
	#[serde(default)]
	items: Option<Vec<Object>>,
}

#[derive(Debug, Default, Deserialize)]
struct ObjectTypeList {
	#[serde(default, rename = "objectTypes")]
	object_types: Option<Vec<ObjectType>>,
}

#[derive(Debug, Default, Deserialize)]
struct FunnelList {
	#[serde(default)]
	funnels: Option<Vec<Funnel>>,
}

fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T> {
	serde_json::from_str(body).map_err(|source| Error::Decode {
		url: url.to_owned(),
		source,
	})
}

#[derive(Clone, Debug)]
pub struct ApiClient {
	base_url: String,
	client: reqwest::Client,
}

impl ApiClient {
	pub fn new(base_url: &str) -> Self {
		Self {
			base_url: base_url.trim_end_matches('/').to_owned(),
			client: reqwest::Client::new(),
		}
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}

	async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, u32)]) -> Result<T> {
		let url = self.url(path);
		let response = self
			.client
			.get(&url)
			.query(query)
			.send()
			.await
			.map_err(|source| Error::Http {
				url: url.clone(),
				source,
			})?;

		let status = response.status();
		if !status.is_success() {
			return Err(Error::Status {
				url,
				status: status.as_u16(),
			});
		}

		let body = response.text().await.map_err(|source| Error::Http {
			url: url.clone(),
			source,
		})?;
		decode(&url, &body)
	}

	/// `GET /objects/advanced?page_size=N`
	pub async fn fetch_objects(&self, page_size: u32) -> Result<Vec<Object>> {
		let page: ObjectPage = self
			.get("/objects/advanced", &[("page_size", page_size)])
			.await?;
		let objects = page.items.unwrap_or_default();
		debug!("fetched {} objects", objects.len());
		Ok(objects)
	}

	pub async fn fetch_object_types(&self) -> Result<Vec<ObjectType>> {
		let list: ObjectTypeList = self
			.get("/setting/object-types", &[("page_size", OBJECT_TYPE_PAGE_SIZE)])
			.await?;
		Ok(list.object_types.unwrap_or_default())
	}

	pub async fn fetch_funnels(&self) -> Result<Vec<Funnel>> {
		let list: FunnelList = self.get("/setting/funnels", &[]).await?;
		Ok(list.funnels.unwrap_or_default())
	}

	/// Object types and funnels, read once per refresh.
	pub async fn fetch_snapshot(&self) -> Result<Snapshot> {
		let object_types = self.fetch_object_types().await?;
		let funnels = self.fetch_funnels().await?;
		debug!(
			"fetched snapshot: {} object types, {} funnels",
			object_types.len(),
			funnels.len()
		);
		Ok(Snapshot {
			object_types,
			funnels,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn object_page_tolerates_missing_and_null_items() {
		let page: ObjectPage = decode("u", "{}").unwrap();
		assert!(page.items.unwrap_or_default().is_empty());

		let page: ObjectPage = decode("u", r#"{"items": null, "total": 0}"#).unwrap();
		assert!(page.items.unwrap_or_default().is_empty());

		let page: ObjectPage =
			decode("u", r#"{"items": [{"id": "a", "name": "Acme", "tags": []}]}"#).unwrap();
		assert_eq!(page.items.unwrap()[0].id, "a");
	}

	#[test]
	fn object_type_list_uses_camel_case_envelope() {
		let list: ObjectTypeList = decode(
			"u",
			r#"{"objectTypes": [{"id": "t", "name": "Company", "fields": {"owner": "object"}}], "totalCount": 1}"#,
		)
		.unwrap();
		let types = list.object_types.unwrap();
		assert!(types[0].is_object_field("owner"));
	}

	#[test]
	fn malformed_body_is_a_decode_error() {
		let err = decode::<FunnelList>("/setting/funnels", "<html>").unwrap_err();
		assert!(matches!(err, Error::Decode { ref url, .. } if url == "/setting/funnels"));
		assert!(err.to_string().starts_with("could not decode response from /setting/funnels"));
	}

	#[test]
	fn base_url_is_joined_without_double_slash() {
		let client = ApiClient::new("https://kb.example.com/api/");
		assert_eq!(
			client.url("/objects/advanced"),
			"https://kb.example.com/api/objects/advanced"
		);
	}
}
