//! Usage guide prompt definition.
//!
//! The one static instructional document this server exposes. It takes no
//! arguments and describes the available tool, the response envelope, and
//! the error taxonomy.

use super::PromptDefinition;
use rmcp::model::PromptArgument;

/// Static instructions for working with this gateway server.
pub struct UsageGuidePrompt;

impl PromptDefinition for UsageGuidePrompt {
    const NAME: &'static str = "usage_guide";
    const DESCRIPTION: &'static str =
        "Instructions for using the resource search tool and interpreting its responses";

    fn template() -> &'static str {
        r#"# Resource Gateway Usage

## Overview
This server fronts an external resource service. All calls go through a
gateway that validates arguments, authenticates upstream on your behalf,
and bounds how many calls run at once.

## Available Tool

### search_resources(query, limit=10)
Search the upstream service for resources.

**Parameters:**
- `query` (string, required): search term or phrase; must not be blank
- `limit` (integer, optional): maximum results, 1-100, default 10

**Example usage:**
```
search_resources("data governance")
search_resources("sales reports", limit=5)
```

## Response Envelope
Every call returns the same envelope:
- `success`: whether the call succeeded
- `request_id`: opaque token correlating request and response
- `payload`: present on success; contains `query`, `total_found`, `limit`,
  and `resources` (records with id, name, description, type, created_date,
  owner, tags, url)
- `error`: present on failure; contains `kind` and `message`

## Error Kinds
- `invalid_argument`: an argument failed its constraint; fix the call
- `throttled`: too many calls in flight; back off and retry later
- `unauthenticated`: upstream authentication failed; retrying triggers a
  fresh authentication attempt
- `timeout`: the upstream call exceeded its deadline
- `upstream_error`: the upstream service reported a failure
- `malformed_upstream_data`: the upstream answer could not be interpreted
- `internal_error`: unexpected fault in the gateway; details are in the
  server log, not in the message

Failures are never retried automatically; retry decisions belong to you."#
    }

    fn arguments() -> Vec<PromptArgument> {
        vec![]
    }
}
