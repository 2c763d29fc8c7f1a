use std::sync::Mutex;

use bns_ai::generate::{legal_guidance_prompt, GenerationPipeline, GenerationSettings};
use bns_ai::llm::{FragmentStream, GenerationRequest, StreamingLlm};
use bns_core::error::AppError;
use pretty_assertions::assert_eq;

struct ScriptedLlm {
    fragments: Vec<Result<String, AppError>>,
    seen: Mutex<Vec<(String, String, f32)>>,
}

impl ScriptedLlm {
    fn new(fragments: Vec<Result<&str, AppError>>) -> Self {
        Self {
            fragments: fragments.into_iter().map(|r| r.map(str::to_string)).collect(),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl StreamingLlm for ScriptedLlm {
    fn stream(&self, req: &GenerationRequest<'_>) -> Result<FragmentStream, AppError> {
        self.seen.lock().unwrap().push((
            req.model.to_string(),
            req.prompt.to_string(),
            req.temperature,
        ));
        Ok(Box::new(self.fragments.clone().into_iter()))
    }
}

#[test]
fn streams_sanitized_updates_and_returns_final_answer() {
    let llm = ScriptedLlm::new(vec![
        Ok("<think>The user"),
        Ok(" was hit\n</think>\n"),
        Ok("- BNS Section 115(2): hurt.\n"),
        Ok("- Punishment: up to one year, fine up to $100."),
    ]);
    let settings = GenerationSettings::default();
    let pipeline = GenerationPipeline::new(&llm, &settings);

    let mut updates = Vec::new();
    let answer = pipeline
        .run("### Section: 115", "my neighbor hit me", &mut |s: &str| updates.push(s.to_string()))
        .unwrap();

    assert_eq!(
        answer,
        "- BNS Section 115(2): hurt.\n- Punishment: up to one year, fine up to \\$100."
    );
    assert_eq!(updates.len(), 4);
    assert_eq!(updates[0], "");
    assert!(updates.iter().all(|u| !u.contains("<think>")));
    assert_eq!(updates.last().unwrap(), &answer);

    let seen = llm.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "deepseek-r1:1.5b");
    assert_eq!(seen[0].1, legal_guidance_prompt("my neighbor hit me", "### Section: 115"));
    assert!((seen[0].2 - 0.1).abs() < f32::EPSILON);
}

#[test]
fn mid_stream_failure_aborts_the_answer() {
    let llm = ScriptedLlm::new(vec![
        Ok("- BNS Section 303"),
        Err(AppError::new("AI_GENERATION_TIMEOUT", "Ollama chat timed out").with_retryable(true)),
        Ok("never seen"),
    ]);
    let settings = GenerationSettings::default();
    let pipeline = GenerationPipeline::new(&llm, &settings);

    let mut updates = 0;
    let err = pipeline
        .run("ctx", "q", &mut |_: &str| updates += 1)
        .unwrap_err();
    assert_eq!(err.code, "AI_GENERATION_TIMEOUT");
    assert_eq!(updates, 1);
}

#[test]
fn answer_that_sanitizes_to_nothing_is_an_error() {
    let llm = ScriptedLlm::new(vec![Ok("<think>only reasoning")]);
    let settings = GenerationSettings {
        model: "custom".to_string(),
        temperature: 0.0,
    };
    let err = GenerationPipeline::new(&llm, &settings)
        .run("ctx", "q", &mut |_: &str| {})
        .unwrap_err();
    assert_eq!(err.code, "AI_GENERATION_FAILED");
    assert_eq!(llm.seen.lock().unwrap()[0].0, "custom");
}

#[test]
fn generate_is_lazy_and_single_use() {
    let llm = ScriptedLlm::new(vec![Ok("a"), Ok("b")]);
    let settings = GenerationSettings::default();
    let pipeline = GenerationPipeline::new(&llm, &settings);

    let mut stream = pipeline.generate("ctx", "q").unwrap();
    assert_eq!(stream.next().unwrap().unwrap(), "a");
    assert_eq!(stream.next().unwrap().unwrap(), "b");
    assert!(stream.next().is_none());

    // A second query needs a second call.
    pipeline.generate("ctx", "q").unwrap();
    assert_eq!(llm.seen.lock().unwrap().len(), 2);
}
