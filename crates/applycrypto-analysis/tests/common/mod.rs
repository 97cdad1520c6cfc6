//! Shared fixture: a small Spring + MyBatis employee project.

#![allow(dead_code)]

use applycrypto_analysis::SourceArtifact;

pub const CONTROLLER: &str = r#"package com.acme.emp.web;

import com.acme.emp.service.EmpService;
import com.acme.emp.vo.EmpVO;
import java.util.List;
import javax.servlet.http.HttpSession;
import org.springframework.web.bind.annotation.*;

@RestController
@RequestMapping("/emp")
public class EmpController {
    private EmpService empService;

    @PostMapping("/save")
    public void save(@RequestBody EmpVO vo) {
        empService.register(vo);
    }

    @GetMapping("/search")
    public List<EmpVO> search(@RequestParam String name) {
        return empService.findByName(name);
    }

    @PostMapping("/copy")
    public void copyFromSession(HttpSession session) {
        EmpVO vo = (EmpVO) session.getAttribute("emp");
        empService.register(vo);
    }

    @GetMapping("/login")
    public String login(@RequestParam String name, HttpSession session) {
        EmpVO me = empService.findOne(name);
        session.setAttribute("me", me);
        return "home";
    }

    @PostMapping("/refresh")
    public EmpVO refresh(HttpSession session) {
        EmpVO cached = (EmpVO) session.getAttribute("me");
        EmpVO fresh = empService.findOne(cached.getEmpNm());
        session.setAttribute("me", fresh);
        return fresh;
    }

    @GetMapping("/me")
    public Object me(HttpSession session) {
        return session.getAttribute("member");
    }

    @DeleteMapping("/purge")
    public void purge(@RequestBody EmpVO vo) {
        empService.purge(vo, 3);
    }
}
"#;

pub const SERVICE: &str = r#"package com.acme.emp.service;

import com.acme.emp.mapper.EmpMapper;
import com.acme.emp.vo.EmpVO;
import java.util.List;
import org.springframework.stereotype.Service;

@Service
public class EmpService {
    private EmpMapper empMapper;

    public void register(EmpVO vo) {
        empMapper.insertEmp(vo);
    }

    public List<EmpVO> findByName(String name) {
        return empMapper.selectByName(name);
    }

    public EmpVO findOne(String name) {
        return empMapper.selectMe(name);
    }

    public void purge(EmpVO vo, int depth) {
        if (depth > 0) {
            purge(vo, depth - 1);
        }
        empMapper.deleteByName(vo);
    }
}
"#;

pub const MAPPER_JAVA: &str = r#"package com.acme.emp.mapper;

import com.acme.emp.vo.EmpVO;
import java.util.List;
import org.apache.ibatis.annotations.Param;

public interface EmpMapper {
    int insertEmp(EmpVO vo);

    List<EmpVO> selectByName(@Param("search") String search);

    EmpVO selectMe(@Param("name") String name);

    int deleteByName(EmpVO vo);

    List<EmpVO> selectAll();

    int insertArchive(List<EmpVO> rows);
}
"#;

pub const MAPPER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mapper namespace="com.acme.emp.mapper.EmpMapper">
  <insert id="insertEmp">
    INSERT INTO employee (emp_nm, birth_dt, dept_cd) VALUES (#{empNm}, #{birthDt}, #{deptCd})
  </insert>
  <select id="selectByName">
    SELECT emp_nm FROM employee WHERE emp_nm = #{search}
  </select>
  <select id="selectMe">
    SELECT emp_nm, birth_dt FROM employee WHERE emp_nm = #{name}
  </select>
  <delete id="deleteByName">
    DELETE FROM employee WHERE emp_nm = #{empNm}
  </delete>
  <select id="selectAll">
    SELECT emp_nm, birth_dt FROM employee
  </select>
  <insert id="insertArchive">
    INSERT INTO employee_archive (emp_nm, birth_dt) VALUES (#{empNm}, #{birthDt})
  </insert>
  <update id="orphanUpdate">
    UPDATE employee SET emp_nm = #{empNm} WHERE emp_no = #{empNo}
  </update>
  <select id="selectStar">
    SELECT * FROM employee
  </select>
</mapper>
"#;

pub const JOB: &str = r#"package com.acme.emp.batch;

import com.acme.emp.mapper.EmpMapper;
import com.acme.emp.vo.EmpVO;
import java.util.List;
import org.springframework.scheduling.annotation.Scheduled;

public class EmpArchiveJob {
    private EmpMapper empMapper;

    @Scheduled(cron = "0 0 1 * * *")
    public void archive() {
        List<EmpVO> rows = empMapper.selectAll();
        empMapper.insertArchive(rows);
    }
}
"#;

pub const INSERT_EMP: &str = "com.acme.emp.mapper.EmpMapper.insertEmp";
pub const SELECT_BY_NAME: &str = "com.acme.emp.mapper.EmpMapper.selectByName";
pub const SELECT_ME: &str = "com.acme.emp.mapper.EmpMapper.selectMe";
pub const DELETE_BY_NAME: &str = "com.acme.emp.mapper.EmpMapper.deleteByName";
pub const SELECT_ALL: &str = "com.acme.emp.mapper.EmpMapper.selectAll";
pub const INSERT_ARCHIVE: &str = "com.acme.emp.mapper.EmpMapper.insertArchive";
pub const ORPHAN_UPDATE: &str = "com.acme.emp.mapper.EmpMapper.orphanUpdate";
pub const SELECT_STAR: &str = "com.acme.emp.mapper.EmpMapper.selectStar";

/// (relative path, content) for every fixture file.
pub fn files() -> Vec<(&'static str, &'static str)> {
    vec![
        ("src/main/java/com/acme/emp/web/EmpController.java", CONTROLLER),
        ("src/main/java/com/acme/emp/service/EmpService.java", SERVICE),
        ("src/main/java/com/acme/emp/mapper/EmpMapper.java", MAPPER_JAVA),
        ("src/main/resources/mapper/EmpMapper.xml", MAPPER_XML),
        ("src/main/java/com/acme/emp/batch/EmpArchiveJob.java", JOB),
    ]
}

pub fn artifacts() -> Vec<SourceArtifact> {
    files()
        .into_iter()
        .map(|(path, content)| SourceArtifact::new(path, content))
        .collect()
}
