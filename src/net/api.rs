//! Endpoint catalog for the backend services.
//!
//! Every method is a passthrough: the caller supplies the form or JSON
//! payload, the backend's answer comes back uninterpreted. Agent endpoints
//! take multipart forms uniformly.
//!
//! ERROR HANDLING
//! ==============
//! These calls return the raw [`GatewayError`]; callers bypassing the store
//! handle rejection themselves. Unauthorized responses have already been
//! handled globally by the gateway by the time the error arrives.

use serde_json::Value;

use super::gateway::{ApiRequest, Gateway, GatewayError, path_segment};
use super::payload::FormData;

type ApiResult<T = Value> = Result<T, GatewayError>;

#[derive(Clone, Debug)]
pub struct Api {
    gateway: Gateway,
}

impl Api {
    #[must_use]
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    #[must_use]
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi { gateway: &self.gateway }
    }

    #[must_use]
    pub fn conversations(&self) -> ConversationsApi<'_> {
        ConversationsApi { gateway: &self.gateway }
    }

    #[must_use]
    pub fn uml(&self) -> UmlApi<'_> {
        UmlApi { gateway: &self.gateway }
    }

    #[must_use]
    pub fn question(&self) -> QuestionApi<'_> {
        QuestionApi { gateway: &self.gateway }
    }

    #[must_use]
    pub fn explain(&self) -> ExplainApi<'_> {
        ExplainApi { gateway: &self.gateway }
    }

    #[must_use]
    pub fn paper(&self) -> PaperApi<'_> {
        PaperApi { gateway: &self.gateway }
    }

    #[must_use]
    pub fn test(&self) -> TestApi<'_> {
        TestApi { gateway: &self.gateway }
    }

    #[must_use]
    pub fn knowledge(&self) -> KnowledgeApi<'_> {
        KnowledgeApi { gateway: &self.gateway }
    }

    #[must_use]
    pub fn review_plan(&self) -> ReviewPlanApi<'_> {
        ReviewPlanApi { gateway: &self.gateway }
    }
}

fn with_query(mut request: ApiRequest, query: &[(&str, &str)]) -> ApiRequest {
    for (key, value) in query {
        request = request.query(*key, value);
    }
    request
}

// =============================================================================
// AUTH
// =============================================================================

pub struct AuthApi<'a> {
    gateway: &'a Gateway,
}

impl AuthApi<'_> {
    /// Current user profile (`GET /auth/me`).
    pub async fn get_profile(&self) -> ApiResult {
        self.gateway.get("/auth/me").await
    }

    /// Update the current user profile (`PUT /auth/me`).
    pub async fn update_profile(&self, profile: Value) -> ApiResult {
        self.gateway.put("/auth/me", profile).await
    }

    /// Change the password (`POST /auth/change-password`).
    pub async fn change_password(&self, current_password: &str, new_password: &str) -> ApiResult {
        let form = FormData::new()
            .text("current_password", current_password)
            .text("new_password", new_password);
        self.gateway.post("/auth/change-password", form).await
    }
}

// =============================================================================
// CONVERSATIONS
// =============================================================================

pub struct ConversationsApi<'a> {
    gateway: &'a Gateway,
}

impl ConversationsApi<'_> {
    /// Filtered listing; the filter travels as a multipart form.
    pub async fn list(&self, filter: FormData) -> ApiResult {
        self.gateway.post("/conversations", filter).await
    }

    /// Delete one conversation (`DELETE /conversations/{id}`).
    pub async fn delete(&self, id: &str) -> ApiResult {
        self.gateway.delete(&format!("/conversations/{}", path_segment(id))).await
    }

    /// Delete every conversation of the user (`DELETE /conversations`).
    pub async fn delete_all(&self) -> ApiResult {
        self.gateway.delete("/conversations").await
    }
}

// =============================================================================
// AGENTS
// =============================================================================

pub struct UmlApi<'a> {
    gateway: &'a Gateway,
}

impl UmlApi<'_> {
    /// Generate a UML diagram (`POST /umlAgent/generate_uml`).
    pub async fn generate(&self, form: FormData) -> ApiResult {
        self.gateway.post("/umlAgent/generate_uml", form).await
    }
}

pub struct QuestionApi<'a> {
    gateway: &'a Gateway,
}

impl QuestionApi<'_> {
    /// Solve and explain a question (`POST /questionAgent/explain_question`).
    pub async fn explain(&self, form: FormData) -> ApiResult {
        self.gateway.post("/questionAgent/explain_question", form).await
    }

    /// Generate a practice set (`POST /questionAgent/generate_practice_set`).
    pub async fn generate_practice(&self, form: FormData) -> ApiResult {
        self.gateway.post("/questionAgent/generate_practice_set", form).await
    }

    /// Saved practice history (`GET /questionAgent/practice_history`).
    pub async fn practice_history(&self, query: &[(&str, &str)]) -> ApiResult {
        let request = with_query(ApiRequest::get("/questionAgent/practice_history"), query);
        self.gateway.send(request).await
    }

    /// One practice history entry (`GET /questionAgent/practice_history/{id}`).
    pub async fn practice_history_item(&self, item_id: &str) -> ApiResult {
        self.gateway.get(&format!("/questionAgent/practice_history/{}", path_segment(item_id))).await
    }

    /// Save a practice attempt (`POST /questionAgent/save_practice_history`).
    pub async fn save_practice_history(&self, form: FormData) -> ApiResult {
        self.gateway.post("/questionAgent/save_practice_history", form).await
    }

    /// Delete one history entry (`DELETE /questionAgent/practice_history/{id}`).
    pub async fn delete_practice_history(&self, item_id: &str) -> ApiResult {
        self.gateway.delete(&format!("/questionAgent/practice_history/{}", path_segment(item_id))).await
    }

    /// Delete all practice history (`DELETE /questionAgent/practice_history`).
    pub async fn clear_practice_history(&self) -> ApiResult {
        self.gateway.delete("/questionAgent/practice_history").await
    }

    /// Rendered practice set as a document file.
    pub async fn download_practice_set(&self, form: FormData) -> ApiResult<Vec<u8>> {
        self.gateway
            .send_bytes(ApiRequest::post("/questionAgent/download_practice_set", form))
            .await
    }

    /// Grade submitted answers (`POST /questionAgent/grade_practice_set`).
    pub async fn grade_practice_set(&self, form: FormData) -> ApiResult {
        self.gateway.post("/questionAgent/grade_practice_set", form).await
    }
}

pub struct ExplainApi<'a> {
    gateway: &'a Gateway,
}

impl ExplainApi<'_> {
    /// Explain a course concept (`POST /explainAgent/explain`).
    pub async fn get_explanation(&self, form: FormData) -> ApiResult {
        self.gateway.post("/explainAgent/explain", form).await
    }
}

pub struct PaperApi<'a> {
    gateway: &'a Gateway,
}

impl PaperApi<'_> {
    /// Search papers (`POST /paperAgent/search_papers`).
    pub async fn search(&self, form: FormData) -> ApiResult {
        self.gateway.post("/paperAgent/search_papers", form).await
    }

    /// Fetch and summarize one paper (`POST /paperAgent/download_and_read_paper`).
    pub async fn detail(&self, form: FormData) -> ApiResult {
        self.gateway.post("/paperAgent/download_and_read_paper", form).await
    }

    /// Assess a paper for a project (`POST /paperAgent/analyze_paper_for_project`).
    pub async fn analyze(&self, form: FormData) -> ApiResult {
        self.gateway.post("/paperAgent/analyze_paper_for_project", form).await
    }

    /// Recommend a learning path (`POST /paperAgent/recommend_learning_path`).
    pub async fn recommend_learning_path(&self, form: FormData) -> ApiResult {
        self.gateway.post("/paperAgent/recommend_learning_path", form).await
    }
}

pub struct TestApi<'a> {
    gateway: &'a Gateway,
}

impl TestApi<'_> {
    /// Generate test cases for code (`POST /testAgent/generate_test_cases`).
    pub async fn generate_test_cases(&self, form: FormData) -> ApiResult {
        self.gateway.post("/testAgent/generate_test_cases", form).await
    }

    /// Analyze code testability (`POST /testAgent/analyze_code_for_testability`).
    pub async fn analyze_testability(&self, form: FormData) -> ApiResult {
        self.gateway.post("/testAgent/analyze_code_for_testability", form).await
    }

    /// Evaluate test coverage (`POST /testAgent/evaluate_test_coverage`).
    pub async fn evaluate_test_coverage(&self, form: FormData) -> ApiResult {
        self.gateway.post("/testAgent/evaluate_test_coverage", form).await
    }
}

// =============================================================================
// KNOWLEDGE
// =============================================================================

pub struct KnowledgeApi<'a> {
    gateway: &'a Gateway,
}

impl KnowledgeApi<'_> {
    /// Knowledge bases of the user (`GET /list_knowledge_bases`).
    pub async fn list_knowledge_bases(&self) -> ApiResult {
        self.gateway.get("/list_knowledge_bases").await
    }

    /// Build a knowledge base from uploads (`POST /create_or_update_index`).
    pub async fn create_knowledge_base(&self, form: FormData) -> ApiResult {
        self.gateway.post("/create_or_update_index", form).await
    }

    /// Add files to an existing knowledge base.
    pub async fn update_knowledge_base(&self, mut form: FormData) -> ApiResult {
        form.append("is_update", "true");
        self.gateway.post("/create_or_update_index", form).await
    }

    /// Delete a knowledge base (`POST /delete_knowledge_base`).
    pub async fn delete_knowledge_base(&self, form: FormData) -> ApiResult {
        self.gateway.post("/delete_knowledge_base", form).await
    }

    /// Attach a knowledge base to an agent by label.
    pub async fn update_label(&self, form: FormData) -> ApiResult {
        self.gateway.post("/update_label", form).await
    }

    /// Knowledge entries (`GET /knowledge`).
    pub async fn list(&self, query: &[(&str, &str)]) -> ApiResult {
        self.gateway.send(with_query(ApiRequest::get("/knowledge"), query)).await
    }

    /// One knowledge entry (`GET /knowledge/{id}`).
    pub async fn detail(&self, id: &str) -> ApiResult {
        self.gateway.get(&format!("/knowledge/{}", path_segment(id))).await
    }

    /// Create a knowledge entry (`POST /knowledge`).
    pub async fn create(&self, entry: Value) -> ApiResult {
        self.gateway.post("/knowledge", entry).await
    }

    /// Replace a knowledge entry (`PUT /knowledge/{id}`).
    pub async fn update(&self, id: &str, entry: Value) -> ApiResult {
        self.gateway.put(&format!("/knowledge/{}", path_segment(id)), entry).await
    }

    /// Delete a knowledge entry (`DELETE /knowledge/{id}`).
    pub async fn delete(&self, id: &str) -> ApiResult {
        self.gateway.delete(&format!("/knowledge/{}", path_segment(id))).await
    }

    /// Study notes (`GET /knowledge/notes`).
    pub async fn notes(&self, query: &[(&str, &str)]) -> ApiResult {
        self.gateway.send(with_query(ApiRequest::get("/knowledge/notes"), query)).await
    }

    /// Create a study note (`POST /knowledge/notes`).
    pub async fn create_note(&self, note: Value) -> ApiResult {
        self.gateway.post("/knowledge/notes", note).await
    }
}

// =============================================================================
// REVIEW PLANS
// =============================================================================

pub struct ReviewPlanApi<'a> {
    gateway: &'a Gateway,
}

impl ReviewPlanApi<'_> {
    /// Generate a review plan (`POST /reviewAgent/generate_plan`).
    pub async fn generate(&self, form: FormData) -> ApiResult {
        self.gateway.post("/reviewAgent/generate_plan", form).await
    }

    /// Review plans (`GET /reviewAgent/plans`).
    pub async fn list(&self, query: &[(&str, &str)]) -> ApiResult {
        self.gateway.send(with_query(ApiRequest::get("/reviewAgent/plans"), query)).await
    }

    /// One review plan (`GET /reviewAgent/plans/{id}`).
    pub async fn detail(&self, plan_id: &str) -> ApiResult {
        self.gateway.get(&format!("/reviewAgent/plans/{}", path_segment(plan_id))).await
    }

    /// Delete a review plan (`DELETE /reviewAgent/plans/{id}`).
    pub async fn delete(&self, plan_id: &str) -> ApiResult {
        self.gateway.delete(&format!("/reviewAgent/plans/{}", path_segment(plan_id))).await
    }

    /// Mark a plan step done or not (`PUT /reviewAgent/plans/{plan}/steps/{step}`).
    pub async fn update_step_status(&self, plan_id: &str, step_id: &str, is_completed: bool) -> ApiResult {
        let form = FormData::new().text("is_completed", is_completed.to_string());
        self.gateway
            .put(&format!("/reviewAgent/plans/{}/steps/{}", path_segment(plan_id), path_segment(step_id)), form)
            .await
    }

    /// The user's plans, optionally capped at `limit` (omitted when `None`).
    pub async fn plans(&self, limit: Option<u32>) -> ApiResult {
        let mut request = ApiRequest::get("/reviewAgent/plans");
        if let Some(limit) = limit {
            request = request.query("limit", limit);
        }
        self.gateway.send(request).await
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
