// SPDX-License-Identifier: Apache-2.0

use crate::errors::ApiErrorCode;
use leadline_model::{FormStep, ProductLine};
use serde_json::{json, Value};

/// Every `(method, path)` the server exposes, in OpenAPI path syntax.
pub const V1_ROUTES: [(&str, &str); 11] = [
    ("get", "/healthz"),
    ("get", "/metrics"),
    ("get", "/readyz"),
    ("post", "/v1/contact"),
    ("post", "/v1/leads"),
    ("post", "/v1/leads/validate"),
    ("get", "/v1/openapi.json"),
    ("get", "/v1/portal/summary"),
    ("get", "/v1/products"),
    ("post", "/v1/quotes/{product}"),
    ("get", "/v1/version"),
];

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ApiErrorEnvelope"}}}
    })
}

fn submission_responses() -> Value {
    json!({
        "201": {
            "description": "submission accepted",
            "content": {"application/json": {"schema": {"$ref": "#/components/schemas/LeadAccepted"}}}
        },
        "400": error_response("invalid json or failed validation"),
        "413": error_response("request body too large"),
        "422": error_response("unsupported product line"),
        "429": error_response("rate limited; see retry-after"),
        "502": error_response("crm rejected or unreachable with fallback disabled"),
        "504": error_response("delivery timed out")
    })
}

fn json_body(schema: &str) -> Value {
    json!({
        "required": true,
        "content": {"application/json": {"schema": {"$ref": format!("#/components/schemas/{schema}")}}}
    })
}

#[must_use]
pub fn openapi_v1_spec() -> Value {
    let error_codes: Vec<&str> = ApiErrorCode::ALL.iter().map(|c| c.as_str()).collect();
    let products: Vec<&str> = ProductLine::ALL.iter().map(|p| p.as_str()).collect();
    let steps: Vec<&str> = FormStep::ALL.iter().map(|s| s.as_str()).collect();
    json!({
      "openapi": "3.0.3",
      "info": {
        "title": "leadline API",
        "version": "v1"
      },
      "paths": {
        "/healthz": {"get": {"responses": {"200": {"description": "process is alive"}}}},
        "/readyz": {
          "get": {
            "responses": {
              "200": {"description": "ready"},
              "503": error_response("starting or draining")
            }
          }
        },
        "/metrics": {"get": {"responses": {"200": {"description": "prometheus metrics"}}}},
        "/v1/version": {"get": {"responses": {"200": {"description": "service version and crm mode"}}}},
        "/v1/openapi.json": {"get": {"responses": {"200": {"description": "this document"}}}},
        "/v1/products": {
          "get": {"responses": {"200": {"description": "product lines with their form steps and fields"}}}
        },
        "/v1/leads": {
          "post": {
            "requestBody": json_body("LeadSubmission"),
            "responses": submission_responses()
          }
        },
        "/v1/quotes/{product}": {
          "post": {
            "parameters": [
              {"name": "product", "in": "path", "required": true, "schema": {"type": "string", "enum": products}}
            ],
            "requestBody": json_body("LeadSubmission"),
            "responses": submission_responses()
          }
        },
        "/v1/leads/validate": {
          "post": {
            "requestBody": json_body("StepValidationRequest"),
            "responses": {
              "200": {"description": "step validation result; `valid` is false when fields fail"},
              "400": error_response("invalid json or unknown step"),
              "422": error_response("unsupported product line")
            }
          }
        },
        "/v1/contact": {
          "post": {
            "requestBody": json_body("ContactMessage"),
            "responses": submission_responses()
          }
        },
        "/v1/portal/summary": {
          "get": {
            "parameters": [
              {"name": "x-api-key", "in": "header", "required": true, "schema": {"type": "string"}}
            ],
            "responses": {
              "200": {"description": "lead counts and billing placeholder"},
              "401": error_response("missing or invalid api key"),
              "404": error_response("portal disabled")
            }
          }
        }
      },
      "components": {
        "schemas": {
          "ApiErrorCode": {"type": "string", "enum": error_codes},
          "ApiError": {
            "type": "object",
            "required": ["code", "message", "details", "request_id"],
            "additionalProperties": false,
            "properties": {
              "code": {"$ref": "#/components/schemas/ApiErrorCode"},
              "message": {"type": "string"},
              "details": {"type": "object"},
              "request_id": {"type": "string"}
            }
          },
          "ApiErrorEnvelope": {
            "type": "object",
            "required": ["error"],
            "properties": {"error": {"$ref": "#/components/schemas/ApiError"}}
          },
          "LeadSubmission": {
            "type": "object",
            "additionalProperties": false,
            "properties": {
              "product": {"type": "string", "enum": products},
              "contact": {"type": "object"},
              "details": {"type": "object"},
              "consent": {
                "type": "object",
                "properties": {"tcpa": {"type": "boolean"}, "privacy_policy": {"type": "boolean"}}
              },
              "attribution": {"type": "object"},
              "notes": {"type": "string", "maxLength": leadline_model::NOTES_MAX_LEN},
              "website": {"type": "string", "description": "leave empty"}
            }
          },
          "StepValidationRequest": {
            "type": "object",
            "required": ["step"],
            "properties": {
              "step": {"type": "string", "enum": steps},
              "lead": {"$ref": "#/components/schemas/LeadSubmission"}
            }
          },
          "ContactMessage": {
            "type": "object",
            "additionalProperties": false,
            "required": ["name", "email", "message"],
            "properties": {
              "name": {"type": "string"},
              "email": {"type": "string"},
              "phone": {"type": "string"},
              "subject": {"type": "string", "maxLength": leadline_model::SUBJECT_MAX_LEN},
              "message": {"type": "string", "maxLength": leadline_model::MESSAGE_MAX_LEN},
              "website": {"type": "string", "description": "leave empty"}
            }
          },
          "LeadAccepted": {
            "type": "object",
            "required": ["lead_id", "status", "kind", "received_at_ms", "crm"],
            "properties": {
              "lead_id": {"type": "string"},
              "status": {"type": "string", "enum": ["accepted"]},
              "kind": {"type": "string", "enum": ["quote", "contact"]},
              "product": {"type": "string", "enum": products},
              "received_at_ms": {"type": "integer"},
              "crm": {
                "type": "object",
                "properties": {
                  "mode": {"type": "string", "enum": ["live", "mock"]},
                  "record_id": {"type": "string"},
                  "fallback_reason": {"type": "string"}
                }
              },
              "relay": {
                "type": "object",
                "properties": {"delivered": {"type": "boolean"}, "error": {"type": "string"}}
              }
            }
          }
        }
      }
    })
}
