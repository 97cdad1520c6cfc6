//! Whole-run behavior: idempotence, invalid inputs, cancellation, directory
//! runs and per-wrapping-type strategy selection.

mod common;

use std::fs;
use std::time::Duration;

use applycrypto_analysis::flow::{CryptoAction, SourceKind};
use applycrypto_analysis::pipeline::AnalysisEngine;
use applycrypto_analysis::SourceArtifact;
use applycrypto_core::config::SqlWrappingType;
use applycrypto_core::errors::error_code;
use applycrypto_core::errors::PipelineError;
use applycrypto_core::{ApplyCryptoConfig, Cancellable, CancellationToken};

fn engine() -> AnalysisEngine {
    AnalysisEngine::new(ApplyCryptoConfig::default())
}

#[test]
fn test_two_runs_are_byte_identical() {
    let first = engine().run(&common::artifacts(), &CancellationToken::new()).unwrap();
    let second = engine().run(&common::artifacts(), &CancellationToken::new()).unwrap();
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    assert_eq!(first.flows, second.flows);
}

#[test]
fn test_input_order_does_not_change_output() {
    let mut reversed = common::artifacts();
    reversed.reverse();
    let a = engine().run(&common::artifacts(), &CancellationToken::new()).unwrap();
    let b = engine().run(&reversed, &CancellationToken::new()).unwrap();
    let ids_a: Vec<_> = a.flows.iter().map(|f| f.id.clone()).collect();
    let ids_b: Vec<_> = b.flows.iter().map(|f| f.id.clone()).collect();
    assert_eq!(ids_a, ids_b);
}

#[test]
fn test_zero_artifacts_is_invalid_input() {
    let err = engine().run(&[], &CancellationToken::new()).unwrap_err();
    assert!(matches!(err, PipelineError::NoSourceArtifacts));
}

#[test]
fn test_only_unanalyzable_artifacts_is_invalid_input() {
    let artifacts = vec![
        SourceArtifact::new("README.md", "# readme"),
        SourceArtifact::new("pom.xml", "<project></project>"),
    ];
    let err = engine().run(&artifacts, &CancellationToken::new()).unwrap_err();
    assert!(matches!(err, PipelineError::NoAnalyzableArtifacts { provided: 2 }));
}

#[test]
fn test_cancelled_token_stops_before_parse() {
    let token = CancellationToken::new();
    token.cancel();
    let err = engine().run(&common::artifacts(), &token).unwrap_err();
    assert!(matches!(err, PipelineError::Cancelled { phase: "parse" }));
}

#[test]
fn test_elapsed_deadline_is_reported_as_such() {
    let token = CancellationToken::with_deadline(Duration::ZERO);
    let err = engine().run(&common::artifacts(), &token).unwrap_err();
    assert!(matches!(err, PipelineError::DeadlineExceeded { .. }));
}

#[test]
fn test_diagnostics_count_outcomes() {
    let report = engine().run(&common::artifacts(), &CancellationToken::new()).unwrap();
    let d = &report.diagnostics;
    assert_eq!(d.artifacts, 5);
    assert_eq!(d.parsed_files, 5);
    assert_eq!(d.queries, 8);
    assert_eq!(d.unresolved_queries, 1);
    assert_eq!(d.unreachable_queries, 1);
    assert_eq!(d.codes.get(error_code::UNREACHABLE), Some(&1));
    assert_eq!(d.codes.get(error_code::RESOLUTION_FAILURE), Some(&1));
    assert!(d.flows_by_action.contains_key("ENCRYPT_THEN_DECRYPT"));
    assert!(report.coverage.methods_marked >= 8);
    assert_eq!(report.coverage.scheduled, 1);
}

#[test]
fn test_report_json_carries_the_consumer_fields() {
    let report = engine().run(&common::artifacts(), &CancellationToken::new()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    let flow = &json["flows"][0];
    for key in ["id", "source", "sink", "path", "action", "placements", "columns"] {
        assert!(flow.get(key).is_some(), "missing {key}");
    }
    assert!(json["table_access"].as_array().is_some_and(|t| !t.is_empty()));
    assert!(json["call_trees"].as_array().is_some_and(|t| !t.is_empty()));
}

#[test]
fn test_table_access_summarizes_employee() {
    let report = engine().run(&common::artifacts(), &CancellationToken::new()).unwrap();
    let employee = report
        .table_access
        .iter()
        .find(|t| t.table == "employee")
        .expect("employee table");
    assert!(employee.query_types.len() >= 3);
    assert!(employee.sensitive_columns().any(|c| c.name == "emp_nm"));
    assert!(employee
        .access_files
        .contains("src/main/java/com/acme/emp/service/EmpService.java"));
}

#[test]
fn test_run_on_root_walks_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    for (path, content) in common::files() {
        let full = dir.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }
    fs::write(dir.path().join("notes.txt"), "not source").unwrap();

    let report = engine().run_on_root(dir.path(), &CancellationToken::new()).unwrap();
    assert!(report
        .flows
        .iter()
        .any(|f| f.query_id == common::INSERT_EMP && f.action == CryptoAction::Encrypt));
}

const MEMBER_DAO: &str = r#"package com.acme.member;

import java.sql.Connection;
import java.sql.PreparedStatement;

public class MemberDao {
    private Connection conn;

    public void insert(MemberVO vo) throws Exception {
        String sql = "INSERT INTO member (mbr_nm, jumin_no) ";
        sql += "VALUES (?, ?)";
        PreparedStatement ps = conn.prepareStatement(sql);
        ps.setString(1, vo.getName());
        ps.setString(2, vo.getJumin());
        ps.executeUpdate();
    }
}
"#;

const MEMBER_SERVICE: &str = r#"package com.acme.member;

public class MemberService {
    private MemberDao memberDao;

    public void join(MemberVO vo) {
        memberDao.insert(vo);
    }
}
"#;

const MEMBER_CONTROLLER: &str = r#"package com.acme.member;

import org.springframework.stereotype.Controller;
import org.springframework.web.bind.annotation.PostMapping;

@Controller
public class MemberController {
    private MemberService memberService;

    @PostMapping("/member/join")
    public String join(MemberVO vo) {
        memberService.join(vo);
        return "ok";
    }
}
"#;

#[test]
fn test_jdbc_wrapping_places_encrypt_above_the_dao() {
    let mut config = ApplyCryptoConfig::default();
    config.analysis.sql_wrapping_type = Some(SqlWrappingType::Jdbc);
    let artifacts = vec![
        SourceArtifact::new("src/com/acme/member/MemberDao.java", MEMBER_DAO),
        SourceArtifact::new("src/com/acme/member/MemberService.java", MEMBER_SERVICE),
        SourceArtifact::new("src/com/acme/member/MemberController.java", MEMBER_CONTROLLER),
    ];
    let report = AnalysisEngine::new(config)
        .run(&artifacts, &CancellationToken::new())
        .unwrap();

    let flow = report
        .flows
        .iter()
        .find(|f| f.query_id.starts_with("com.acme.member.MemberDao.insert(MemberVO)@"))
        .expect("jdbc insert flow");
    assert_eq!(flow.source, Some(SourceKind::HttpRequest));
    assert_eq!(flow.action, CryptoAction::Encrypt);
    assert_eq!(flow.placements[0].method, "com.acme.member.MemberService.join(MemberVO)");
    assert_eq!(flow.placements[0].call_target, "memberDao.insert");
    let names: Vec<_> = flow.columns.iter().map(|c| c.column.as_str()).collect();
    assert_eq!(names, vec!["jumin_no", "mbr_nm"]);
}
