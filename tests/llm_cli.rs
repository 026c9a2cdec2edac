mod support;

use assert_cmd::Command;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::{contains, is_empty};
use serde_json::{Value, json};

use support::{MockServer, isolated, parse_stdout_json};

fn llm_cmd() -> Command {
    isolated(Command::new(assert_cmd::cargo::cargo_bin!("bokja-llm")))
}

fn llm_against(server: &MockServer) -> Command {
    let mut cmd = llm_cmd();
    cmd.env("OPENAI_API_KEY", "sk-test-key")
        .env("OPENAI_BASE_URL", format!("{}/v1", server.url));
    cmd
}

fn text_reply(content: &str) -> String {
    json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
    .to_string()
}

fn tool_reply(arguments: &str) -> String {
    json!({
        "choices": [{
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": { "name": "get_matching_mdnos", "arguments": arguments }
                }]
            }
        }]
    })
    .to_string()
}

const REPORT_JSON: &str = r#"{"hospital":"서울내과","category":"감기약","taken":3,"start_date":"2025-11-01","end_date":"2025-11-14","total_cycle":10,"cur_cycle":9,"save_cycle":6,"effects":[{"week":1,"effect_list":[{"efno":1,"name":"두통","count":2}]},{"week":2,"effect_list":[]}]}"#;

#[test]
fn unknown_mode_exits_one_with_empty_stdout() {
    llm_cmd()
        .args(["translate", "hello"])
        .assert()
        .code(1)
        .stdout(is_empty())
        .stderr(contains("Invalid mode: translate"));
}

#[test]
fn missing_mode_is_a_usage_error() {
    llm_cmd().assert().code(1).stdout(is_empty());
}

#[test]
fn missing_argument_names_the_parameter() {
    llm_cmd()
        .args(["match_meds", "[\"타이레놀정500mg\"]"])
        .assert()
        .code(1)
        .stdout(is_empty())
        .stderr(contains("Error in match_meds: missing argument <db_meds_json>"));
}

#[test]
fn malformed_json_fails_before_any_request() {
    llm_cmd()
        .args(["category", "해열제, 콧물약"])
        .assert()
        .code(1)
        .stdout(is_empty())
        .stderr(contains("malformed <classifications_json>"));
}

#[test]
fn missing_api_key_is_reported() {
    llm_cmd()
        .args(["category", "[\"해열제\"]"])
        .assert()
        .code(1)
        .stdout(is_empty())
        .stderr(contains("OPENAI_API_KEY is not set in the environment"));
}

#[test]
fn category_returns_one_unquoted_string() {
    let server = MockServer::respond(200, &text_reply("\"감기약\"\n"));

    let assert = llm_against(&server)
        .args(["category", "[\"해열제\",\"콧물약\"]"])
        .assert()
        .success();

    assert_eq!(
        String::from_utf8(assert.get_output().stdout.clone()).unwrap(),
        "\"감기약\"\n"
    );
    assert_eq!(parse_stdout_json(&assert.get_output().stdout), json!("감기약"));

    let request = server.request();
    assert_eq!(request.request_line, "POST /v1/chat/completions HTTP/1.1");
    assert_eq!(request.header("authorization"), Some("Bearer sk-test-key"));
    let body = request.json();
    assert_eq!(body["model"], "gpt-4-0613");
    assert_eq!(body["messages"][0]["role"], "system");
    assert!(
        body["messages"][1]["content"]
            .as_str()
            .unwrap()
            .contains("[\"해열제\",\"콧물약\"]")
    );
    assert!(body.get("tools").is_none());
}

#[test]
fn match_meds_forces_function_call_and_returns_ids() {
    let server = MockServer::respond(200, &tool_reply("{\"mdnos\": [13, 7]}"));

    let assert = llm_against(&server)
        .env("BOKJA_LLM_MODEL", "gpt-4o-mini")
        .args([
            "match_meds",
            "[\"타이레놀정500mg\",\"코대원···\"]",
            "[{\"mdno\":7,\"name\":\"코대원포르테시럽\"},{\"mdno\":13,\"name\":\"타이레놀정500밀리그람\"}]",
        ])
        .assert()
        .success();

    assert_eq!(parse_stdout_json(&assert.get_output().stdout), json!([13, 7]));

    let body = server.request().json();
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["tool_choice"]["function"]["name"], "get_matching_mdnos");
    assert_eq!(
        body["tools"][0]["function"]["parameters"]["properties"]["mdnos"]["items"]["type"],
        "integer"
    );
}

#[test]
fn match_meds_rejects_wrong_number_of_ids() {
    let server = MockServer::respond(200, &tool_reply("{\"mdnos\": [13]}"));

    llm_against(&server)
        .args(["match_meds", "[\"a\",\"b\"]", "[]"])
        .assert()
        .code(1)
        .stdout(is_empty())
        .stderr(contains("model returned 1 ids for 2 scanned names"));

    server.request();
}

#[test]
fn description_returns_trimmed_text() {
    let server = MockServer::respond(200, &text_reply("  이 약은 해열진통제입니다.  \n"));

    let assert = llm_against(&server)
        .args(["description", "타이레놀정500mg", "해열진통제", "[]"])
        .assert()
        .success();

    assert_eq!(
        parse_stdout_json(&assert.get_output().stdout),
        json!("이 약은 해열진통제입니다.")
    );
    let body = server.request().json();
    let prompt = body["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("- 약품 정보: 타이레놀정500mg"));
}

#[test]
fn report_summary_returns_base64_of_utf8_summary() {
    let summary = "10회 중 6회 복용하셨어요.\n두통이 계속되면 상담하세요.";
    let server = MockServer::respond(200, &text_reply(summary));

    let assert = llm_against(&server)
        .args(["report_summary", &STANDARD.encode(REPORT_JSON)])
        .assert()
        .success();

    let encoded = parse_stdout_json(&assert.get_output().stdout);
    let decoded = STANDARD.decode(encoded.as_str().unwrap()).unwrap();
    assert_eq!(String::from_utf8(decoded).unwrap(), summary);

    let body = server.request().json();
    let prompt = body["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("- 복약 순응도: 60%"));
    assert!(prompt.contains("1주차: 두통 2회"));
    assert!(prompt.contains("2주차: 보고된 부작용 없음"));
}

#[test]
fn report_summary_accepts_raw_json_payload() {
    let server = MockServer::respond(200, &text_reply("좋아요"));

    let assert = llm_against(&server)
        .args(["report_summary", REPORT_JSON])
        .assert()
        .success();

    let encoded = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(encoded, Value::from(STANDARD.encode("좋아요")));
    server.request();
}

#[test]
fn report_summary_rejects_undecodable_payload() {
    llm_cmd()
        .args(["report_summary", "!!not base64!!"])
        .assert()
        .code(1)
        .stdout(is_empty())
        .stderr(contains("Error in report_summary: malformed <report_payload>"));
}

#[test]
fn remote_error_status_exits_one() {
    let server = MockServer::respond(500, "{\"error\":{\"message\":\"overloaded\"}}");

    llm_against(&server)
        .args(["category", "[\"해열제\"]"])
        .assert()
        .code(1)
        .stdout(is_empty())
        .stderr(contains("openai API error 500").and(contains("overloaded")));

    server.request();
}

#[test]
fn debug_logging_does_not_leak_api_key() {
    let server = MockServer::respond(200, &text_reply("감기약"));
    let secret = "sk-super-secret-value";

    llm_against(&server)
        .env("OPENAI_API_KEY", secret)
        .env("BOKJA_LOG", "bokja_ai=debug")
        .args(["category", "[\"해열제\"]"])
        .assert()
        .success()
        .stderr(contains("openai request model=gpt-4-0613").and(contains(secret).not()));

    server.request();
}

#[test]
fn help_flag_after_mode_is_an_argument() {
    llm_cmd()
        .args(["category", "--help"])
        .assert()
        .code(1)
        .stdout(is_empty())
        .stderr(contains("malformed <classifications_json>"));
}

#[test]
fn undecodable_reply_is_an_unexpected_response() {
    let server = MockServer::respond(200, "<html>upstream timeout</html>");

    llm_against(&server)
        .args(["category", "[\"해열제\"]"])
        .assert()
        .code(1)
        .stdout(is_empty())
        .stderr(contains(
            "Error in category: openai returned an unexpected response",
        ));

    server.request();
}
