use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde_json::{json, Value};

/// `GET /` answers 301 to the docs page.
pub async fn root() -> impl IntoResponse {
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, "/docs")])
}

pub async fn docs() -> Html<&'static str> {
    Html(DOCS_PAGE)
}

pub async fn openapi() -> Json<Value> {
    Json(openapi_document())
}

const DOCS_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Wine RAG API</title>
</head>
<body>
  <h1>Wine RAG API</h1>
  <p>Ask for wine recommendations grounded in the indexed wine ratings.</p>
  <h2>POST /ask</h2>
  <p>Body: <code>{"query": "a bold red for steak"}</code></p>
  <p>Reply: <code>{"response": "..."}</code>, or <code>{"error": "...", "type": "..."}</code>.
     The status is always 200.</p>
  <h2>GET /health</h2>
  <p>Configuration summary. Does not contact any backend.</p>
  <p>Machine-readable schema: <a href="/openapi.json">/openapi.json</a></p>
</body>
</html>
"#;

fn openapi_document() -> Value {
    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "Wine RAG API",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "paths": {
            "/": {
                "get": {
                    "summary": "Redirect to the docs page",
                    "responses": { "301": { "description": "Redirect to /docs" } }
                }
            },
            "/health": {
                "get": {
                    "summary": "Configuration-derived status",
                    "responses": { "200": { "description": "Service status" } }
                }
            },
            "/ask": {
                "post": {
                    "summary": "Answer a wine question from the indexed ratings",
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/QueryRequest" }
                            }
                        }
                    },
                    "responses": {
                        "200": {
                            "description": "Answer, or an in-band error",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "oneOf": [
                                            { "$ref": "#/components/schemas/AnswerResponse" },
                                            { "$ref": "#/components/schemas/ErrorResponse" }
                                        ]
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "QueryRequest": {
                    "type": "object",
                    "required": ["query"],
                    "properties": { "query": { "type": "string" } }
                },
                "AnswerResponse": {
                    "type": "object",
                    "properties": { "response": { "type": "string" } }
                },
                "ErrorResponse": {
                    "type": "object",
                    "properties": {
                        "error": { "type": "string" },
                        "type": { "type": "string" }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_served_paths() {
        let doc = openapi_document();
        let paths = doc["paths"].as_object().unwrap();
        assert!(paths.contains_key("/ask"));
        assert!(paths.contains_key("/health"));
        assert_eq!(
            doc["components"]["schemas"]["QueryRequest"]["required"][0],
            "query"
        );
    }
}
