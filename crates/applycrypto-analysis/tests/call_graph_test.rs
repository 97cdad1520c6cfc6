//! Call graph construction: interface dispatch, NAMESPACE statement ids,
//! boundary nodes, layers, call trees and outbound-sourced flows.

use applycrypto_analysis::call_graph::{
    bfs_forward, bfs_inverse, call_trees, ArgumentBinding, BoundaryKind, CallGraph, EdgeKind, GraphNode, Layer,
    Resolution,
};
use applycrypto_analysis::flow::{CryptoAction, FlowAnalyzer, SourceKind};
use applycrypto_analysis::pipeline::{AnalysisArtifacts, AnalysisEngine};
use applycrypto_analysis::SourceArtifact;
use applycrypto_core::ApplyCryptoConfig;

const CTL: &str = r#"package com.acme.emp.web;

import com.acme.emp.svc.IEmpService;
import org.springframework.web.bind.annotation.PostMapping;
import org.springframework.web.bind.annotation.RestController;

@RestController
public class EmpCtl {
    private IEmpService empService;

    @PostMapping("/emp")
    public void save(EmpVO vo) {
        empService.save(vo);
    }
}
"#;

const SVC_API: &str = r#"package com.acme.emp.svc;

public interface IEmpService {
    void save(EmpVO vo);
}
"#;

const SVC_IMPL: &str = r#"package com.acme.emp.svc;

import com.acme.emp.dao.EmpDao;
import org.springframework.web.client.RestTemplate;

public class EmpServiceImpl implements IEmpService {
    private EmpDao empDao;
    private RestTemplate restTemplate;

    public void save(EmpVO vo) {
        empDao.insert(vo);
    }

    public void sync() {
        EmpVO remote = restTemplate.getForObject("http://hr/emp", EmpVO.class);
        empDao.insert(remote);
    }
}
"#;

const DAO: &str = r#"package com.acme.emp.dao;

import org.apache.ibatis.session.SqlSession;

public class EmpDao {
    private static final String NAMESPACE = "com.acme.emp.EmpDQM.";
    private SqlSession sqlSession;

    public int insert(EmpVO vo) {
        return sqlSession.insert(NAMESPACE + "insertEmp", vo);
    }
}
"#;

const DQM: &str = r#"<mapper namespace="com.acme.emp.EmpDQM">
  <insert id="insertEmp">INSERT INTO employee (emp_nm, jumin_no) VALUES (#{empNm}, #{juminNo})</insert>
</mapper>
"#;

const QUERY: &str = "com.acme.emp.EmpDQM.insertEmp";
const CTL_SAVE: &str = "com.acme.emp.web.EmpCtl.save(EmpVO)";
const IMPL_SAVE: &str = "com.acme.emp.svc.EmpServiceImpl.save(EmpVO)";
const IMPL_SYNC: &str = "com.acme.emp.svc.EmpServiceImpl.sync()";
const DAO_INSERT: &str = "com.acme.emp.dao.EmpDao.insert(EmpVO)";

fn build() -> AnalysisArtifacts {
    let artifacts = vec![
        SourceArtifact::new("src/com/acme/emp/web/EmpCtl.java", CTL),
        SourceArtifact::new("src/com/acme/emp/svc/IEmpService.java", SVC_API),
        SourceArtifact::new("src/com/acme/emp/svc/EmpServiceImpl.java", SVC_IMPL),
        SourceArtifact::new("src/com/acme/emp/dao/EmpDao.java", DAO),
        SourceArtifact::new("src/com/acme/emp/EmpDQM.xml", DQM),
    ];
    AnalysisEngine::new(ApplyCryptoConfig::default()).build_graph(&artifacts)
}

fn idx(graph: &CallGraph, id: &str) -> petgraph::graph::NodeIndex {
    graph.node_index(id).unwrap_or_else(|| panic!("missing node {id}"))
}

#[test]
fn test_interface_call_binds_to_implementation() {
    let built = build();
    let g = &built.graph;
    let callees = g.callees(idx(g, CTL_SAVE));
    let hit = callees
        .iter()
        .find(|a| g.id(a.node) == IMPL_SAVE)
        .expect("edge to implementation");
    assert_eq!(hit.call.kind, EdgeKind::Invokes);
    assert_eq!(hit.call.resolution, Some(Resolution::Implementation));
    assert!(!hit.call.ambiguous);
    assert_eq!(hit.call.binding.expressions().collect::<Vec<_>>(), vec!["vo"]);
}

#[test]
fn test_namespace_constant_resolves_statement() {
    let built = build();
    let g = &built.graph;
    let callees = g.callees(idx(g, DAO_INSERT));
    let exec = callees
        .iter()
        .find(|a| a.call.kind == EdgeKind::Executes)
        .expect("executes edge");
    assert_eq!(g.id(exec.node), QUERY);
    assert_eq!(exec.call.resolution, Some(Resolution::StatementId));
    assert!(exec.call.is_returned);
    match &exec.call.binding {
        ArgumentBinding::Resolved { arguments } => {
            assert_eq!(arguments.len(), 1);
            assert_eq!(arguments[0].expression, "vo");
        }
        ArgumentBinding::Unresolved => panic!("binding should resolve"),
    }
}

#[test]
fn test_library_calls_become_classified_externals() {
    let built = build();
    let g = &built.graph;
    let outbound = g
        .callees(idx(g, IMPL_SYNC))
        .into_iter()
        .find_map(|a| match g.node(a.node) {
            Some(GraphNode::External(e)) => Some(e.clone()),
            _ => None,
        })
        .expect("external callee");
    assert_eq!(outbound.id, "external:restTemplate.getForObject");
    assert_eq!(outbound.boundary, Some(BoundaryKind::OutboundClient));
}

#[test]
fn test_layers_and_entry_points() {
    let built = build();
    let g = &built.graph;
    assert_eq!(g.method(idx(g, CTL_SAVE)).unwrap().layer, Layer::Controller);
    assert_eq!(g.method(idx(g, IMPL_SAVE)).unwrap().layer, Layer::Service);
    assert_eq!(g.method(idx(g, DAO_INSERT)).unwrap().layer, Layer::Repository);
    assert!(g.node(idx(g, CTL_SAVE)).unwrap().is_entry_point());
    assert_eq!(g.entry_points().len(), 1);
    assert_eq!(built.entry_points.len(), 1);
}

#[test]
fn test_stats_reflect_the_build() {
    let built = build();
    let stats = &built.stats;
    assert_eq!(stats.queries, 1);
    assert_eq!(stats.entry_points, 1);
    assert_eq!(stats.dead_queries, 0);
    assert!(stats.resolved_calls >= 4);
    assert!(stats.unresolved_calls >= 1);
    assert_eq!(stats.resolution_counts.get("statement_id"), Some(&1));
    assert!(stats.resolution_rate > 0.0 && stats.resolution_rate <= 1.0);
}

#[test]
fn test_bfs_in_both_directions() {
    let built = build();
    let g = &built.graph;
    let query = idx(g, QUERY);
    let down = bfs_forward(g, idx(g, CTL_SAVE), None);
    assert!(down.contains(&query));
    let up = bfs_inverse(g, query, None);
    assert!(up.contains(&idx(g, CTL_SAVE)));
    assert!(up.contains(&idx(g, IMPL_SYNC)));
    let near = bfs_inverse(g, query, Some(1));
    assert_eq!(near, vec![idx(g, DAO_INSERT)]);
}

#[test]
fn test_call_tree_from_entry_point() {
    let built = build();
    let trees = call_trees(&built.graph, 20);
    assert_eq!(trees.len(), 1);
    let root = &trees[0];
    assert_eq!(root.id, CTL_SAVE);
    assert_eq!(root.line, None);
    assert_eq!(root.children[0].id, IMPL_SAVE);
    assert_eq!(root.children[0].children[0].id, DAO_INSERT);
    assert_eq!(root.children[0].children[0].children[0].id, QUERY);

    let shallow = call_trees(&built.graph, 1);
    assert!(shallow[0].children[0].truncated);
}

#[test]
fn test_outbound_client_sources_a_flow() {
    let built = build();
    let analyzer = FlowAnalyzer::new(&Default::default());
    let flows = analyzer.analyze_query(&built.graph, QUERY).unwrap();
    assert_eq!(flows.len(), 2);

    let external = flows
        .iter()
        .find(|f| f.source == Some(SourceKind::ExternalApi))
        .expect("outbound flow");
    assert_eq!(external.action, CryptoAction::Encrypt);
    assert_eq!(external.path[0], IMPL_SYNC);
    assert_eq!(external.placements[0].method, IMPL_SYNC);
    assert_eq!(external.placements[0].target_variable.as_deref(), Some("remote"));

    let http = flows
        .iter()
        .find(|f| f.source == Some(SourceKind::HttpRequest))
        .expect("http flow");
    assert_eq!(http.placements[0].method, IMPL_SAVE);
    assert_eq!(http.placements[0].call_target, "empDao.insert");
}
