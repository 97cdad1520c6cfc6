//! End-to-end benchmarks over generated controller/service/mapper stacks.
//!
//! Run with: cargo bench -p applycrypto-analysis --bench flow_bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use applycrypto_analysis::flow::FlowAnalyzer;
use applycrypto_analysis::pipeline::AnalysisEngine;
use applycrypto_analysis::SourceArtifact;
use applycrypto_core::{ApplyCryptoConfig, CancellationToken};

/// One controller → service → mapper stack per module, with an insert and a
/// sensitive lookup each.
fn generate(modules: usize) -> Vec<SourceArtifact> {
    let mut artifacts = Vec::with_capacity(modules * 4);
    for i in 0..modules {
        let pkg = format!("com.acme.m{i}");
        artifacts.push(SourceArtifact::new(
            format!("src/com/acme/m{i}/Emp{i}Controller.java"),
            format!(
                r#"package {pkg};

@RestController
@RequestMapping("/m{i}")
public class Emp{i}Controller {{
    private Emp{i}Service service;

    @PostMapping("/save")
    public void save(EmpVO vo) {{
        service.register(vo);
    }}

    @GetMapping("/find")
    public EmpVO find(String name) {{
        return service.find(name);
    }}
}}
"#
            ),
        ));
        artifacts.push(SourceArtifact::new(
            format!("src/com/acme/m{i}/Emp{i}Service.java"),
            format!(
                r#"package {pkg};

@Service
public class Emp{i}Service {{
    private Emp{i}Mapper mapper;

    public void register(EmpVO vo) {{
        mapper.insertEmp(vo);
    }}

    public EmpVO find(String name) {{
        return mapper.selectByName(name);
    }}
}}
"#
            ),
        ));
        artifacts.push(SourceArtifact::new(
            format!("src/com/acme/m{i}/Emp{i}Mapper.java"),
            format!(
                r#"package {pkg};

@Mapper
public interface Emp{i}Mapper {{
    int insertEmp(EmpVO vo);
    EmpVO selectByName(@Param("name") String name);
}}
"#
            ),
        ));
        artifacts.push(SourceArtifact::new(
            format!("res/m{i}/Emp{i}Mapper.xml"),
            format!(
                r#"<mapper namespace="{pkg}.Emp{i}Mapper">
  <insert id="insertEmp">INSERT INTO emp_{i} (emp_nm, birth_dt, dept_cd) VALUES (#{{empNm}}, #{{birthDt}}, #{{deptCd}})</insert>
  <select id="selectByName">SELECT emp_nm, jumin_no FROM emp_{i} WHERE emp_nm = #{{name}}</select>
</mapper>
"#
            ),
        ));
    }
    artifacts
}

fn full_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_run");
    group.sample_size(10);

    let engine = AnalysisEngine::new(ApplyCryptoConfig::default());
    for modules in [10usize, 100] {
        let artifacts = generate(modules);
        group.bench_with_input(BenchmarkId::new("modules", modules), &artifacts, |b, artifacts| {
            b.iter(|| {
                let cancel = CancellationToken::new();
                engine.run(artifacts, &cancel).unwrap()
            });
        });
    }

    group.finish();
}

fn flow_phase(c: &mut Criterion) {
    let mut group = c.benchmark_group("flow_phase");
    group.sample_size(20);

    let engine = AnalysisEngine::new(ApplyCryptoConfig::default());
    let built = engine.build_graph(&generate(200));
    let analyzer = FlowAnalyzer::new(&engine.config().analysis);

    group.bench_function("analyze_400_queries", |b| {
        b.iter(|| analyzer.analyze(&built.graph));
    });

    group.finish();
}

criterion_group!(benches, full_run, flow_phase);
criterion_main!(benches);
