use std::env;

use anyhow::Result;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, oid::ObjectId},
    options::IndexOptions,
    Client, Collection, IndexModel, SearchIndexModel, SearchIndexType,
};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::document::{Document, SearchResult};

const EMBEDDING_SIZE: i32 = 1536;
const TEXT_INDEX: &str = "text_index";
const VECTOR_INDEX: &str = "vector_index";
const CANDIDATE_FACTOR: usize = 15;

static CLIENT: OnceCell<Client> = OnceCell::const_new();

async fn client(uri: &str) -> Result<&'static Client> {
    CLIENT
        .get_or_try_init(|| async { Client::with_uri_str(uri).await.map_err(Into::into) })
        .await
}

/// A handle on the document collection. The underlying client is created
/// once per process and reused for every `Store`.
#[derive(Debug, Clone)]
pub struct Store {
    collection: Collection<Document>,
}

impl Store {
    /// Connects to the collection named by `$MONGODB_DATABASE` and
    /// `$MONGODB_COLLECTION`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the MongoDB client cannot be built.
    pub async fn connect() -> Result<Self> {
        let uri = env::var("MONGODB_URI").expect("$MONGODB_URI not set");
        let database = env::var("MONGODB_DATABASE").unwrap_or_else(|_| "refdesk".to_string());
        let collection = env::var("MONGODB_COLLECTION").unwrap_or_else(|_| "documents".to_string());

        Ok(Self {
            collection: client(&uri).await?.database(&database).collection(&collection),
        })
    }

    /// Searches the keyword text index, best matches first.
    ///
    /// # Errors
    ///
    /// This function will return an error if the query fails.
    pub async fn text_search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        self.collection
            .clone_with_type::<SearchResult>()
            .find(text_filter(query))
            .projection(score_projection("textScore"))
            .sort(doc! { "score": { "$meta": "textScore" } })
            .limit(limit as i64)
            .await?
            .try_collect()
            .await
            .map_err(Into::into)
    }

    /// Runs a k-nearest-neighbour search against the vector index.
    ///
    /// # Errors
    ///
    /// This function will return an error if the aggregation fails.
    pub async fn vector_search(&self, embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.collection
            .aggregate(vector_pipeline(embedding, limit))
            .with_type::<SearchResult>()
            .await?
            .try_collect()
            .await
            .map_err(Into::into)
    }

    /// Inserts a batch of documents, returning how many were written.
    ///
    /// # Errors
    ///
    /// This function will return an error if the insert fails.
    pub async fn insert_batch(&self, documents: Vec<Document>) -> Result<usize> {
        let result = self.collection.insert_many(documents).await?;

        debug!("Inserted {} documents", result.inserted_ids.len());

        Ok(result.inserted_ids.len())
    }

    /// Fetches up to `limit` documents that have no embedding yet.
    ///
    /// # Errors
    ///
    /// This function will return an error if the query fails.
    pub async fn unembedded(&self, limit: usize) -> Result<Vec<Document>> {
        self.collection
            .find(doc! { "embedding": { "$exists": false } })
            .limit(limit as i64)
            .await?
            .try_collect()
            .await
            .map_err(Into::into)
    }

    /// Stores a generated embedding on an existing document.
    ///
    /// # Errors
    ///
    /// This function will return an error if the update fails.
    pub async fn set_embedding(&self, id: ObjectId, embedding: &[f32]) -> Result<()> {
        let values = embedding.iter().copied().map(f64::from).collect::<Vec<_>>();

        self.collection
            .update_one(doc! { "_id": id }, doc! { "$set": { "embedding": values } })
            .await?;

        Ok(())
    }

    /// Creates the keyword text index and the vector search index.
    ///
    /// # Errors
    ///
    /// This function will return an error if index creation fails.
    pub async fn create_indexes(&self) -> Result<()> {
        self.collection
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "text": "text", "title": "text" })
                    .options(IndexOptions::builder().name(TEXT_INDEX.to_string()).build())
                    .build(),
            )
            .await?;

        self.collection
            .create_search_index(
                SearchIndexModel::builder()
                    .name(VECTOR_INDEX.to_string())
                    .index_type(SearchIndexType::VectorSearch)
                    .definition(doc! {
                        "fields": [{
                            "type": "vector",
                            "path": "embedding",
                            "numDimensions": EMBEDDING_SIZE,
                            "similarity": "cosine",
                        }]
                    })
                    .build(),
            )
            .await?;

        Ok(())
    }
}

fn text_filter(query: &str) -> bson::Document {
    doc! { "$text": { "$search": query } }
}

fn score_projection(meta: &str) -> bson::Document {
    doc! { "title": 1, "url": 1, "text": 1, "score": { "$meta": meta } }
}

fn vector_pipeline(embedding: &[f32], limit: usize) -> Vec<bson::Document> {
    // Bson has no f32 variant, so the query vector goes over as doubles.
    let query = embedding.iter().copied().map(f64::from).collect::<Vec<_>>();

    vec![
        doc! {
            "$vectorSearch": {
                "index": VECTOR_INDEX,
                "path": "embedding",
                "queryVector": query,
                "numCandidates": (limit * CANDIDATE_FACTOR) as i32,
                "limit": limit as i32,
            }
        },
        doc! { "$project": score_projection("vectorSearchScore") },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_filter_uses_the_text_operator() {
        let filter = text_filter("compound indexes");

        assert_eq!(
            filter.get_document("$text").unwrap().get_str("$search").unwrap(),
            "compound indexes"
        );
    }

    #[test]
    fn score_projection_keeps_payload_and_meta_score() {
        let projection = score_projection("textScore");

        assert_eq!(projection.get_i32("text").unwrap(), 1);
        assert_eq!(
            projection.get_document("score").unwrap().get_str("$meta").unwrap(),
            "textScore"
        );
    }

    #[test]
    fn vector_pipeline_searches_then_projects() {
        let pipeline = vector_pipeline(&[0.5_f32; 4], 5);
        assert_eq!(pipeline.len(), 2);

        let search = pipeline[0].get_document("$vectorSearch").unwrap();
        assert_eq!(search.get_str("index").unwrap(), VECTOR_INDEX);
        assert_eq!(search.get_str("path").unwrap(), "embedding");
        assert_eq!(search.get_array("queryVector").unwrap().len(), 4);
        assert_eq!(search.get_i32("limit").unwrap(), 5);
        assert_eq!(search.get_i32("numCandidates").unwrap(), 75);

        let project = pipeline[1].get_document("$project").unwrap();
        assert_eq!(
            project.get_document("score").unwrap().get_str("$meta").unwrap(),
            "vectorSearchScore"
        );
    }
}
