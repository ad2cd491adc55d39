use mongodb::bson::oid::ObjectId;

/// A text document as stored in the collection and as encoded on JSONL
/// import lines. The `embedding` field is absent until one is generated.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct Document {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// A retrieved document, scored by whichever search produced it
/// (`textScore` or `vectorSearchScore`).
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    pub text: String,
    pub score: f32,
}

#[derive(Debug, serde::Deserialize, serde::Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SearchResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_bare_jsonl_line() {
        let document: Document =
            serde_json::from_str(r#"{"text": "MongoDB stores documents in BSON."}"#).unwrap();

        assert_eq!(document.text, "MongoDB stores documents in BSON.");
        assert!(document.id.is_none());
        assert!(document.title.is_none());
        assert!(document.embedding.is_none());
    }

    #[test]
    fn deserializes_pre_embedded_jsonl_line() {
        let document: Document = serde_json::from_str(
            r#"{"title": "Indexes", "url": "/docs/indexes", "text": "Indexes speed up queries.", "embedding": [0.1, 0.2]}"#,
        )
        .unwrap();

        assert_eq!(document.title.as_deref(), Some("Indexes"));
        assert_eq!(document.embedding.as_deref(), Some(&[0.1, 0.2][..]));
    }

    #[test]
    fn absent_embedding_is_not_serialized() {
        let document = Document {
            id: None,
            title: None,
            url: None,
            text: "plain".to_string(),
            embedding: None,
        };

        let value = serde_json::to_value(&document).unwrap();
        assert!(value.get("embedding").is_none());
        assert!(value.get("_id").is_none());
    }

    #[test]
    fn search_result_defaults_missing_payload_fields() {
        let result: SearchResult =
            serde_json::from_str(r#"{"text": "hit", "score": 0.87}"#).unwrap();

        assert_eq!(result.title, "");
        assert_eq!(result.url, "");
    }
}
