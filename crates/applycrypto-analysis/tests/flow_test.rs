//! Flow analysis over the employee fixture: source/sink classification,
//! action decisions, insertion points and the session rule.

mod common;

use applycrypto_analysis::call_graph::{enumerate_reverse_paths, TraversalLimits};
use applycrypto_analysis::flow::{
    decide, CryptoAction, FlowAnalyzer, FlowFlag, FlowRecord, FlowStatus, InsertionPosition, SinkKind, SourceKind,
};
use applycrypto_analysis::pipeline::AnalysisEngine;
use applycrypto_analysis::SourceArtifact;
use applycrypto_core::types::sensitivity::SensitivityKind;
use applycrypto_core::{ApplyCryptoConfig, CancellationToken};

use common::*;

fn run() -> Vec<FlowRecord> {
    AnalysisEngine::new(ApplyCryptoConfig::default())
        .run(&artifacts(), &CancellationToken::new())
        .expect("fixture run")
        .flows
}

fn flows_for<'a>(flows: &'a [FlowRecord], query: &str) -> Vec<&'a FlowRecord> {
    flows.iter().filter(|f| f.query_id == query).collect()
}

// Scenario A: an INSERT reached from an HTTP entry point.
#[test]
fn test_insert_from_http_is_encrypted_in_the_service() {
    let flows = run();
    let insert = flows_for(&flows, INSERT_EMP);
    let http: Vec<_> = insert
        .iter()
        .filter(|f| f.source == Some(SourceKind::HttpRequest))
        .collect();
    assert_eq!(http.len(), 1);
    let flow = http[0];

    assert_eq!(flow.status, FlowStatus::Ok);
    assert_eq!(flow.sink, Some(SinkKind::Db));
    assert_eq!(flow.action, CryptoAction::Encrypt);
    assert!(flow.id.starts_with("flow-"));
    assert_eq!(flow.path.first().map(String::as_str), Some("com.acme.emp.web.EmpController.save(EmpVO)"));
    assert_eq!(flow.path.last().map(String::as_str), Some(INSERT_EMP));

    let names: Vec<_> = flow.columns.iter().map(|c| c.column.as_str()).collect();
    assert_eq!(names, vec!["birth_dt", "emp_nm"]);

    assert_eq!(flow.placements.len(), 1);
    let placement = &flow.placements[0];
    assert_eq!(placement.method, "com.acme.emp.service.EmpService.register(EmpVO)");
    assert_eq!(placement.position, InsertionPosition::BeforeCall);
    assert_eq!(placement.call_target, "empMapper.insertEmp");
    assert_eq!(placement.target_variable.as_deref(), Some("vo"));
    assert!(placement.description.starts_with("immediately before call to empMapper.insertEmp"));
    assert_eq!(placement.file, "src/main/java/com/acme/emp/service/EmpService.java");
    let kinds: Vec<_> = placement.columns.iter().map(|c| c.kind).collect();
    assert!(kinds.contains(&SensitivityKind::Name));
    assert!(kinds.contains(&SensitivityKind::DateOfBirth));
}

// Scenario B: WHERE and SELECT list both sensitive.
#[test]
fn test_select_with_sensitive_filter_splits_into_two_placements() {
    let flows = run();
    let select = flows_for(&flows, SELECT_BY_NAME);
    assert_eq!(select.len(), 1);
    let flow = select[0];

    assert_eq!(flow.source, Some(SourceKind::HttpRequest));
    assert_eq!(flow.sink, Some(SinkKind::HttpResponse));
    assert_eq!(flow.action, CryptoAction::EncryptThenDecrypt);
    assert_eq!(flow.placements.len(), 2);

    let before = &flow.placements[0];
    let after = &flow.placements[1];
    assert_eq!(before.action, CryptoAction::Encrypt);
    assert_eq!(before.position, InsertionPosition::BeforeCall);
    assert_eq!(before.target_variable.as_deref(), Some("name"));
    assert_eq!(before.columns.len(), 1);
    assert_eq!(before.columns[0].column, "emp_nm");
    assert_eq!(before.columns[0].bound_parameter.as_deref(), Some("search"));

    assert_eq!(after.action, CryptoAction::Decrypt);
    assert_eq!(after.position, InsertionPosition::AfterCall);
    assert_eq!(after.target_variable.as_deref(), Some("return"));
    assert!(after.description.ends_with("before return statement"));
    assert_eq!(after.columns.len(), 1);
    assert_eq!(after.columns[0].column, "emp_nm");

    assert_eq!(before.method, after.method);
    assert_ne!(before.position, after.position);
}

// Scenario C: reading the session and returning it touches no query.
#[test]
fn test_session_passthrough_produces_no_flow() {
    let flows = run();
    assert!(flows
        .iter()
        .all(|f| !f.path.iter().any(|n| n.starts_with("com.acme.emp.web.EmpController.me("))));
    assert_eq!(decide(SourceKind::Session, SinkKind::HttpResponse), Ok(CryptoAction::None));
}

// Scenario D: self-recursion before the query.
#[test]
fn test_recursive_caller_yields_one_path() {
    let flows = run();
    let delete = flows_for(&flows, DELETE_BY_NAME);
    assert_eq!(delete.len(), 1);
    let flow = delete[0];
    assert_eq!(flow.path_count, 1);
    assert_eq!(flow.action, CryptoAction::Encrypt);
    let purge_hits = flow
        .path
        .iter()
        .filter(|n| n.as_str() == "com.acme.emp.service.EmpService.purge(EmpVO,int)")
        .count();
    assert_eq!(purge_hits, 1);
    assert_eq!(flow.path[0], "com.acme.emp.web.EmpController.purge(EmpVO)");
}

#[test]
fn test_recursion_terminates_in_raw_enumeration() {
    let engine = AnalysisEngine::new(ApplyCryptoConfig::default());
    let built = engine.build_graph(&artifacts());
    let (idx, _) = built.graph.query(DELETE_BY_NAME).unwrap();
    let paths = enumerate_reverse_paths(&built.graph, idx, TraversalLimits::default());
    let rooted: Vec<_> = paths.paths.iter().filter(|p| p.origin.is_rooted()).collect();
    assert_eq!(rooted.len(), 1);
    assert!(!paths.truncated);
}

#[test]
fn test_session_sourced_paths_never_decrypt() {
    let flows = run();
    let session: Vec<_> = flows
        .iter()
        .filter(|f| f.source == Some(SourceKind::Session))
        .collect();
    assert!(!session.is_empty());
    for flow in session {
        assert!(!flow.action.decrypts(), "{} decrypts", flow.id);
        assert!(flow
            .placements
            .iter()
            .all(|p| p.action != CryptoAction::Decrypt));
    }
}

// session → DB → session → response
#[test]
fn test_session_round_trip_only_encrypts_the_filter() {
    let flows = run();
    let refresh = flows
        .iter()
        .find(|f| f.query_id == SELECT_ME && f.path[0].starts_with("com.acme.emp.web.EmpController.refresh("))
        .expect("refresh flow");
    assert_eq!(refresh.source, Some(SourceKind::Session));
    assert_eq!(refresh.action, CryptoAction::Encrypt);
    assert_eq!(refresh.placements.len(), 1);
    assert_eq!(refresh.placements[0].position, InsertionPosition::BeforeCall);
}

#[test]
fn test_session_write_sink_decrypts() {
    let flows = run();
    let login = flows
        .iter()
        .find(|f| f.query_id == SELECT_ME && f.path[0].starts_with("com.acme.emp.web.EmpController.login("))
        .expect("login flow");
    assert_eq!(login.source, Some(SourceKind::HttpRequest));
    assert_eq!(login.sink, Some(SinkKind::Session));
    assert_eq!(login.action, CryptoAction::EncryptThenDecrypt);
}

#[test]
fn test_session_read_before_insert_is_session_sourced() {
    let flows = run();
    let copy = flows_for(&flows, INSERT_EMP)
        .into_iter()
        .find(|f| f.source == Some(SourceKind::Session))
        .expect("session insert");
    assert_eq!(copy.action, CryptoAction::Encrypt);
    assert_eq!(copy.path[0], "com.acme.emp.web.EmpController.copyFromSession(HttpSession)");
}

#[test]
fn test_scheduled_copy_is_a_no_op() {
    let flows = run();
    for query in [SELECT_ALL, INSERT_ARCHIVE] {
        let found = flows_for(&flows, query);
        assert_eq!(found.len(), 1, "{query}");
        let flow = found[0];
        assert_eq!(flow.source, Some(SourceKind::Db));
        assert_eq!(flow.sink, Some(SinkKind::Db));
        assert_eq!(flow.action, CryptoAction::None);
        assert!(flow.placements.is_empty());
    }
}

#[test]
fn test_unreachable_and_unresolved_are_reported() {
    let flows = run();
    let orphan = flows_for(&flows, ORPHAN_UPDATE);
    assert_eq!(orphan.len(), 1);
    assert_eq!(orphan[0].status, FlowStatus::Unreachable);
    assert!(orphan[0].placements.is_empty());
    assert_eq!(orphan[0].columns[0].column, "emp_nm");

    let star = flows_for(&flows, SELECT_STAR);
    assert_eq!(star.len(), 1);
    assert!(matches!(star[0].status, FlowStatus::ResolutionFailed { .. }));
    assert!(star[0].columns.is_empty());
}

#[test]
fn test_analyze_query_matches_full_run() {
    let engine = AnalysisEngine::new(ApplyCryptoConfig::default());
    let built = engine.build_graph(&artifacts());
    let analyzer = FlowAnalyzer::new(&engine.config().analysis);
    let single = analyzer.analyze_query(&built.graph, SELECT_BY_NAME).unwrap();
    let all = analyzer.analyze(&built.graph);
    let from_all: Vec<_> = all.into_iter().filter(|f| f.query_id == SELECT_BY_NAME).collect();
    assert_eq!(single, from_all);

    assert!(analyzer.analyze_query(&built.graph, "no.such.query").is_err());
}

#[test]
fn test_flags_are_clean_on_fixture() {
    let flows = run();
    for flow in flows.iter().filter(|f| f.status == FlowStatus::Ok) {
        assert!(!flow.flags.contains(&FlowFlag::TruncatedTraversal), "{}", flow.query_id);
        assert!(!flow.flags.contains(&FlowFlag::AmbiguousResolution), "{}", flow.query_id);
    }
}

#[test]
fn test_tight_path_cap_marks_flows_truncated() {
    let mut config = ApplyCryptoConfig::default();
    config.analysis.max_paths_per_query = Some(1);
    let engine = AnalysisEngine::new(config);
    let flows = engine.run(&artifacts(), &CancellationToken::new()).unwrap().flows;
    let insert = flows_for(&flows, INSERT_EMP);
    assert_eq!(insert.len(), 1);
    assert!(insert[0].flags.contains(&FlowFlag::TruncatedTraversal));
}

#[test]
fn test_fan_out_cap_drops_callers_and_flags_flows() {
    let mut config = ApplyCryptoConfig::default();
    config.analysis.max_fan_out = Some(1);
    let engine = AnalysisEngine::new(config);
    let built = engine.build_graph(&artifacts());
    let (idx, _) = built.graph.query(INSERT_EMP).unwrap();
    let limits = TraversalLimits::from_config(&engine.config().analysis);
    let paths = enumerate_reverse_paths(&built.graph, idx, limits);
    assert!(paths.fan_out_capped);
    assert_eq!(paths.paths.iter().filter(|p| p.origin.is_rooted()).count(), 1);

    let flows = engine.run(&artifacts(), &CancellationToken::new()).unwrap().flows;
    let insert = flows_for(&flows, INSERT_EMP);
    assert_eq!(insert.len(), 1);
    assert!(insert[0].flags.contains(&FlowFlag::TruncatedTraversal));
}

const COPY_CONTROLLER: &str = r#"package com.acme.copy.web;

import com.acme.copy.service.CopyService;
import javax.servlet.http.HttpSession;
import org.springframework.web.bind.annotation.*;

@RestController
public class CopyController {
    private CopyService copyService;

    @PostMapping("/archive")
    public void archive(@RequestParam String no) {
        copyService.archive(no);
    }

    @GetMapping("/mine")
    public String mine(@RequestParam String no, HttpSession session) {
        session.setAttribute("me", copyService.findOne(no));
        return "home";
    }

    @PostMapping("/copy")
    public void copy(@RequestParam String jumin) {
        copyService.copyByJumin(jumin);
    }
}
"#;

const COPY_SERVICE: &str = r#"package com.acme.copy.service;

import com.acme.copy.mapper.CopyMapper;
import org.springframework.stereotype.Service;

@Service
public class CopyService {
    private CopyMapper copyMapper;

    public void archive(String no) {
        copyMapper.insertArchive(load(no));
    }

    public EmpVO load(String no) {
        EmpVO vo = copyMapper.selectCopy(no);
        return vo;
    }

    public EmpVO findOne(String no) {
        EmpVO found = copyMapper.selectMine(no);
        return found;
    }

    public void copyByJumin(String jumin) {
        copyMapper.copyByJumin(jumin);
    }
}
"#;

const COPY_MAPPER: &str = r#"package com.acme.copy.mapper;

import org.apache.ibatis.annotations.Param;

public interface CopyMapper {
    int insertArchive(EmpVO vo);

    EmpVO selectCopy(@Param("no") String no);

    EmpVO selectMine(@Param("no") String no);

    int copyByJumin(@Param("j") String j);
}
"#;

const COPY_XML: &str = r#"<mapper namespace="com.acme.copy.mapper.CopyMapper">
  <insert id="insertArchive">
    INSERT INTO emp_archive (emp_nm, birth_dt) VALUES (#{empNm}, #{birthDt})
  </insert>
  <select id="selectCopy">
    SELECT emp_nm, birth_dt FROM employee WHERE emp_no = #{no}
  </select>
  <select id="selectMine">
    SELECT emp_nm FROM employee WHERE emp_no = #{no}
  </select>
  <insert id="copyByJumin">
    INSERT INTO emp_archive (emp_nm) SELECT emp_nm FROM employee WHERE jumin_no = #{j}
  </insert>
</mapper>
"#;

fn copy_flows() -> Vec<FlowRecord> {
    let artifacts = vec![
        SourceArtifact::new("src/com/acme/copy/web/CopyController.java", COPY_CONTROLLER),
        SourceArtifact::new("src/com/acme/copy/service/CopyService.java", COPY_SERVICE),
        SourceArtifact::new("src/com/acme/copy/mapper/CopyMapper.java", COPY_MAPPER),
        SourceArtifact::new("src/com/acme/copy/mapper/CopyMapper.xml", COPY_XML),
    ];
    AnalysisEngine::new(ApplyCryptoConfig::default())
        .run(&artifacts, &CancellationToken::new())
        .expect("copy fixture run")
        .flows
}

// `X vo = select(); return vo;` passed straight into an insert.
#[test]
fn test_returned_local_feeding_insert_stays_encrypted() {
    let flows = copy_flows();

    let select = flows_for(&flows, "com.acme.copy.mapper.CopyMapper.selectCopy");
    assert_eq!(select.len(), 1);
    assert_eq!(select[0].source, Some(SourceKind::HttpRequest));
    assert_eq!(select[0].sink, Some(SinkKind::Db));
    assert!(!select[0].action.decrypts());
    assert!(select[0].placements.iter().all(|p| p.action != CryptoAction::Decrypt));

    let insert = flows_for(&flows, "com.acme.copy.mapper.CopyMapper.insertArchive");
    assert_eq!(insert.len(), 1);
    assert_eq!(insert[0].source, Some(SourceKind::Db));
    assert_eq!(insert[0].sink, Some(SinkKind::Db));
    assert_eq!(insert[0].action, CryptoAction::None);
}

#[test]
fn test_returned_local_stored_in_session_is_session_sink() {
    let flows = copy_flows();
    let mine = flows_for(&flows, "com.acme.copy.mapper.CopyMapper.selectMine");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].source, Some(SourceKind::HttpRequest));
    assert_eq!(mine[0].sink, Some(SinkKind::Session));
    assert!(mine[0].action.decrypts());
}

#[test]
fn test_insert_select_encrypts_lookup_not_copied_columns() {
    let flows = copy_flows();
    let copy = flows_for(&flows, "com.acme.copy.mapper.CopyMapper.copyByJumin");
    assert_eq!(copy.len(), 1);
    let flow = copy[0];
    assert_eq!(flow.action, CryptoAction::Encrypt);
    assert_eq!(flow.placements.len(), 1);

    let columns = &flow.placements[0].columns;
    assert_eq!(columns.len(), 1);
    assert_eq!(columns[0].column, "jumin_no");
    assert_eq!(columns[0].kind, SensitivityKind::NationalId);
    assert_eq!(columns[0].bound_parameter.as_deref(), Some("j"));
    assert!(flow.columns.iter().all(|c| c.column != "emp_nm"));
}

const AMB_CONTROLLER: &str = r#"package com.acme.amb.web;

import com.acme.amb.service.AmbService;
import java.util.Map;
import org.springframework.web.bind.annotation.*;

@RestController
public class AmbController {
    private AmbService ambService;

    @PostMapping("/amb")
    public void save(@RequestBody Map payload) {
        ambService.save(payload.get("emp"));
    }

    @PostMapping("/amb/pair")
    public void pair(@RequestBody Map payload) {
        ambService.save(payload.get("emp"), payload.get("dept"));
    }
}
"#;

const AMB_SERVICE: &str = r#"package com.acme.amb.service;

import com.acme.amb.mapper.AmbMapper;
import org.springframework.stereotype.Service;

@Service
public class AmbService {
    private AmbMapper ambMapper;

    public void save(EmpVO vo) {
        ambMapper.insertEmp(vo);
    }

    public void save(DeptVO dept) {
        ambMapper.insertDept(dept);
    }
}
"#;

const AMB_MAPPER: &str = r#"package com.acme.amb.mapper;

public interface AmbMapper {
    int insertEmp(EmpVO vo);

    int insertDept(DeptVO dept);
}
"#;

const AMB_XML: &str = r#"<mapper namespace="com.acme.amb.mapper.AmbMapper">
  <insert id="insertEmp">INSERT INTO employee (emp_nm) VALUES (#{empNm})</insert>
  <insert id="insertDept">INSERT INTO dept (dept_cd) VALUES (#{deptCd})</insert>
</mapper>
"#;

fn amb_artifacts() -> Vec<SourceArtifact> {
    vec![
        SourceArtifact::new("src/com/acme/amb/web/AmbController.java", AMB_CONTROLLER),
        SourceArtifact::new("src/com/acme/amb/service/AmbService.java", AMB_SERVICE),
        SourceArtifact::new("src/com/acme/amb/mapper/AmbMapper.java", AMB_MAPPER),
        SourceArtifact::new("src/com/acme/amb/mapper/AmbMapper.xml", AMB_XML),
    ]
}

#[test]
fn test_untyped_overload_call_picks_first_declaration_and_flags_flow() {
    let engine = AnalysisEngine::new(ApplyCryptoConfig::default());
    let built = engine.build_graph(&amb_artifacts());
    let g = &built.graph;

    for caller in ["com.acme.amb.web.AmbController.save(Map)", "com.acme.amb.web.AmbController.pair(Map)"] {
        let idx = g.node_index(caller).unwrap_or_else(|| panic!("missing {caller}"));
        let edge = g
            .callees(idx)
            .into_iter()
            .find(|a| a.call.call_text == "ambService.save")
            .expect("edge to overload");
        assert_eq!(g.id(edge.node), "com.acme.amb.service.AmbService.save(EmpVO)", "{caller}");
        assert!(edge.call.ambiguous, "{caller}");
    }

    let flows = FlowAnalyzer::new(&engine.config().analysis)
        .analyze_query(g, "com.acme.amb.mapper.AmbMapper.insertEmp")
        .unwrap();
    assert!(!flows.is_empty());
    for flow in &flows {
        assert!(flow.flags.contains(&FlowFlag::AmbiguousResolution), "{}", flow.id);
    }
    let dept = FlowAnalyzer::new(&engine.config().analysis)
        .analyze_query(g, "com.acme.amb.mapper.AmbMapper.insertDept")
        .unwrap();
    assert!(dept.is_empty());
}
