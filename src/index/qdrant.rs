//! Qdrant-backed index over the REST API.

use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{sort_hits, Hit, IndexedVector, SimilarityIndex};
use crate::core::{Embedding, Payload};
use crate::error::{Error, Result};
use crate::ui;

const SEARCH_BATCH: usize = 64;

/// Extra neighbors requested beyond k so ties at the k-th score can be
/// ordered by id on this side
const TIE_MARGIN: usize = 8;

#[derive(Debug, Clone)]
pub struct QdrantSettings {
	pub host: String,
	pub port: u16,
	/// Deadline applied to every request
	pub timeout: Duration,
	pub max_retries: usize,
	pub upsert_batch: usize,
}

/// Blocking client for one Qdrant instance.
pub struct QdrantIndex {
	client: Client,
	base_url: String,
	max_retries: usize,
	upsert_batch: usize,
}

impl QdrantIndex {
	pub fn new(settings: &QdrantSettings) -> Result<Self> {
		let client = Client::builder()
			.timeout(settings.timeout)
			.build()
			.map_err(|e| Error::Upstream(format!("failed to build HTTP client: {}", e)))?;

		Ok(Self {
			client,
			base_url: base_url(&settings.host, settings.port),
			max_retries: settings.max_retries.max(1),
			upsert_batch: settings.upsert_batch.max(1),
		})
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}

	pub fn collection_exists(&self, name: &str) -> Result<bool> {
		let resp = self.send(|| self.client.get(self.url(&format!("/collections/{}", name))))?;
		match resp.status() {
			StatusCode::NOT_FOUND => Ok(false),
			status if status.is_success() => Ok(true),
			_ => Err(failure(resp)),
		}
	}

	fn delete_collection(&self, name: &str) -> Result<()> {
		let resp = self.send(|| self.client.delete(self.url(&format!("/collections/{}", name))))?;
		expect_success(resp, name).map(|_| ())
	}

	fn create_collection(&self, name: &str, dimension: usize) -> Result<()> {
		let body = CreateCollection {
			vectors: VectorParams {
				size: dimension,
				distance: "Cosine",
			},
		};
		let resp = self.send(|| {
			self.client
				.put(self.url(&format!("/collections/{}", name)))
				.json(&body)
		})?;
		expect_success(resp, name).map(|_| ())
	}

	fn upsert(&self, name: &str, points: &[IndexedVector]) -> Result<()> {
		let body = UpsertPoints {
			points: points
				.iter()
				.map(|p| PointStruct {
					id: p.id,
					vector: p.vector.as_slice(),
					payload: &p.payload,
				})
				.collect(),
		};
		let resp = self.send(|| {
			self.client
				.put(self.url(&format!("/collections/{}/points?wait=true", name)))
				.json(&body)
		})?;
		expect_success(resp, name).map(|_| ())
	}

	fn search_batch(&self, name: &str, vectors: &[Embedding], k: usize) -> Result<Vec<Vec<Hit>>> {
		let body = SearchBatch {
			searches: vectors
				.iter()
				.map(|v| SearchRequest {
					vector: v.as_slice(),
					limit: k,
					with_payload: true,
				})
				.collect(),
		};
		let resp = self.send(|| {
			self.client
				.post(self.url(&format!("/collections/{}/points/search/batch", name)))
				.json(&body)
		})?;
		let resp = expect_success(resp, name)?;
		let parsed: ApiResponse<Vec<Vec<ScoredPoint>>> = resp
			.json()
			.map_err(|e| Error::Upstream(format!("invalid search response: {}", e)))?;

		parsed
			.result
			.into_iter()
			.map(into_hits)
			.collect()
	}

	/// Sends a request, retrying transport failures, 429 and 5xx with backoff
	fn send<F>(&self, build: F) -> Result<Response>
	where
		F: Fn() -> RequestBuilder,
	{
		let mut attempt = 0usize;
		loop {
			match build().send() {
				Ok(resp) => {
					let status = resp.status();
					if should_retry(status) && attempt + 1 < self.max_retries {
						attempt += 1;
						ui::debug(&format!("Qdrant returned {}, retry {}", status, attempt));
						thread::sleep(retry_backoff(attempt));
						continue;
					}
					return Ok(resp);
				}
				Err(err) => {
					if is_transient(&err) && attempt + 1 < self.max_retries {
						attempt += 1;
						ui::debug(&format!("Qdrant request failed ({}), retry {}", err, attempt));
						thread::sleep(retry_backoff(attempt));
						continue;
					}
					return Err(Error::Upstream(format!(
						"request failed after {} attempts: {}",
						attempt + 1,
						err
					)));
				}
			}
		}
	}
}

impl SimilarityIndex for QdrantIndex {
	fn build(&mut self, collection: &str, dimension: usize, points: Vec<IndexedVector>) -> Result<()> {
		if let Some(bad) = points.iter().find(|p| p.vector.dimension() != dimension) {
			return Err(Error::InvalidDimension {
				expected: dimension,
				actual: bad.vector.dimension(),
			});
		}

		// Recreate so that points from an earlier, larger run do not linger
		if self.collection_exists(collection)? {
			ui::debug(&format!("Dropping existing collection {}", collection));
			self.delete_collection(collection)?;
		}
		self.create_collection(collection, dimension)?;

		for chunk in points.chunks(self.upsert_batch) {
			self.upsert(collection, chunk)?;
		}
		Ok(())
	}

	fn query(&self, collection: &str, vector: &Embedding, k: usize) -> Result<Vec<Hit>> {
		let mut batch = self.query_batch(collection, std::slice::from_ref(vector), k)?;
		Ok(batch.pop().unwrap_or_default())
	}

	fn query_batch(&self, collection: &str, vectors: &[Embedding], k: usize) -> Result<Vec<Vec<Hit>>> {
		if k == 0 {
			return Ok(vec![Vec::new(); vectors.len()]);
		}

		let limit = k + TIE_MARGIN;
		let mut all = Vec::with_capacity(vectors.len());
		for chunk in vectors.chunks(SEARCH_BATCH) {
			let rows = self.search_batch(collection, chunk, limit)?;
			for (vector, mut hits) in chunk.iter().zip(rows) {
				let mut limit = limit;
				while tie_may_be_cut(&hits, k, limit) {
					limit *= 2;
					ui::debug(&format!("Score tie at rank {}, widening search to {}", k, limit));
					hits = self
						.search_batch(collection, std::slice::from_ref(vector), limit)?
						.pop()
						.unwrap_or_default();
				}
				hits.truncate(k);
				all.push(hits);
			}
		}
		Ok(all)
	}
}

fn base_url(host: &str, port: u16) -> String {
	let host = host.trim().trim_end_matches('/');
	if host.starts_with("http://") || host.starts_with("https://") {
		format!("{}:{}", host, port)
	} else {
		format!("http://{}:{}", host, port)
	}
}

/// Connection and deadline failures; malformed requests are never retried
fn is_transient(err: &reqwest::Error) -> bool {
	err.is_connect() || err.is_timeout()
}

fn should_retry(status: StatusCode) -> bool {
	status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn retry_backoff(attempt: usize) -> Duration {
	let capped = attempt.min(5) as u32;
	Duration::from_millis(250 * (1 << capped))
}

fn expect_success(resp: Response, collection: &str) -> Result<Response> {
	match resp.status() {
		StatusCode::NOT_FOUND => Err(Error::CollectionNotFound(collection.to_string())),
		status if status.is_success() => Ok(resp),
		_ => Err(failure(resp)),
	}
}

fn failure(resp: Response) -> Error {
	let status = resp.status();
	let body = resp
		.text()
		.unwrap_or_else(|_| "<body unavailable>".to_string());
	Error::Upstream(format!("Qdrant request failed ({}): {}", status, body))
}

/// A full page whose last score equals the k-th score may have left out
/// equally scored points with smaller ids
fn tie_may_be_cut(hits: &[Hit], k: usize, limit: usize) -> bool {
	k > 0 && hits.len() >= limit && hits.len() > k && hits[k - 1].score == hits[hits.len() - 1].score
}

/// Converts raw points to hits, enforcing the score/id ordering
fn into_hits(points: Vec<ScoredPoint>) -> Result<Vec<Hit>> {
	let mut hits = points
		.into_iter()
		.map(|p| {
			let payload = match p.payload {
				Some(value) => serde_json::from_value(value)
					.map_err(|e| Error::Upstream(format!("invalid payload for point {}: {}", p.id, e)))?,
				None => Payload {
					key: String::new(),
					full_description: String::new(),
					fields: Default::default(),
				},
			};
			Ok(Hit {
				id: p.id,
				score: p.score,
				payload,
			})
		})
		.collect::<Result<Vec<_>>>()?;

	sort_hits(&mut hits);
	Ok(hits)
}

#[derive(Serialize)]
struct CreateCollection {
	vectors: VectorParams,
}

#[derive(Serialize)]
struct VectorParams {
	size: usize,
	distance: &'static str,
}

#[derive(Serialize)]
struct UpsertPoints<'a> {
	points: Vec<PointStruct<'a>>,
}

#[derive(Serialize)]
struct PointStruct<'a> {
	id: u64,
	vector: &'a [f32],
	payload: &'a Payload,
}

#[derive(Serialize)]
struct SearchBatch<'a> {
	searches: Vec<SearchRequest<'a>>,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
	vector: &'a [f32],
	limit: usize,
	with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
	result: T,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
	id: u64,
	score: f32,
	#[serde(default)]
	payload: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn base_url_adds_scheme_when_missing() {
		assert_eq!(base_url("localhost", 6333), "http://localhost:6333");
		assert_eq!(base_url("https://qdrant.internal/", 443), "https://qdrant.internal:443");
	}

	#[test]
	fn backoff_grows_and_caps() {
		assert!(retry_backoff(2) > retry_backoff(1));
		assert_eq!(retry_backoff(9), retry_backoff(5));
	}

	#[test]
	fn retries_only_transient_statuses() {
		assert!(should_retry(StatusCode::TOO_MANY_REQUESTS));
		assert!(should_retry(StatusCode::BAD_GATEWAY));
		assert!(!should_retry(StatusCode::NOT_FOUND));
		assert!(!should_retry(StatusCode::BAD_REQUEST));
	}

	#[test]
	fn batch_search_response_is_parsed_and_reordered() {
		let body = r#"{
			"result": [[
				{"id": 7, "version": 0, "score": 0.5, "payload": {"key": "b", "full_description": "beer", "fields": {"PRICE": "20"}}},
				{"id": 3, "version": 0, "score": 0.5, "payload": {"key": "a", "full_description": "ale"}},
				{"id": 9, "version": 0, "score": 0.9, "payload": {"key": "c", "full_description": "cider"}}
			]],
			"status": "ok",
			"time": 0.001
		}"#;

		let parsed: ApiResponse<Vec<Vec<ScoredPoint>>> = serde_json::from_str(body).unwrap();
		let points = parsed.result.into_iter().next().unwrap();
		let hits = into_hits(points).unwrap();

		let ids: Vec<u64> = hits.iter().map(|h| h.id).collect();
		assert_eq!(ids, vec![9, 3, 7]);
		assert_eq!(hits[2].payload.field("PRICE"), "20");
		assert!(hits[1].payload.fields.is_empty());
	}

	#[test]
	fn malformed_request_fails_without_retrying() {
		let index = QdrantIndex::new(&QdrantSettings {
			host: "http://[::1".to_string(),
			port: 6333,
			timeout: Duration::from_secs(1),
			max_retries: 4,
			upsert_batch: 16,
		})
		.unwrap();

		let err = index.collection_exists("alm_products").unwrap_err();
		assert!(matches!(err, Error::Upstream(ref msg) if msg.contains("after 1 attempts")), "{}", err);
	}

	fn hit(id: u64, score: f32) -> Hit {
		Hit {
			id,
			score,
			payload: Payload {
				key: id.to_string(),
				full_description: String::new(),
				fields: Default::default(),
			},
		}
	}

	#[test]
	fn tie_spanning_the_page_end_needs_a_wider_search() {
		// k = 2, page of 3: ranks 2 and 3 tie, more points may share the score
		let tied = vec![hit(1, 0.9), hit(4, 0.7), hit(6, 0.7)];
		assert!(tie_may_be_cut(&tied, 2, 3));

		let settled = vec![hit(1, 0.9), hit(4, 0.7), hit(6, 0.5)];
		assert!(!tie_may_be_cut(&settled, 2, 3));

		// short page: the collection has no further points
		let short = vec![hit(1, 0.7), hit(2, 0.7)];
		assert!(!tie_may_be_cut(&short, 1, 3));
	}

	#[test]
	fn point_payload_serializes_as_object() {
		let payload = Payload {
			key: "42".into(),
			full_description: "gin 700ml".into(),
			fields: [("PRICE".to_string(), "55".to_string())].into_iter().collect(),
		};
		let point = PointStruct {
			id: 0,
			vector: &[0.5, 0.5],
			payload: &payload,
		};
		let json = serde_json::to_value(&point).unwrap();
		assert_eq!(json["payload"]["key"], "42");
		assert_eq!(json["payload"]["fields"]["PRICE"], "55");
		assert_eq!(json["vector"][1], 0.5);
	}
}
