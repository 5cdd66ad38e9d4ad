//! Synthetic Spring/MyBatis sources for the benchmarks.
//!
//! Entity `i` gets a controller, a service that also calls the service of
//! entity `i + 1`, a mapper interface and a mapper XML.

pub struct SyntheticProject {
    /// `(path, content)` of every Java file.
    pub java: Vec<(String, String)>,
    /// `(path, content)` of every mapper XML.
    pub mappers: Vec<(String, String)>,
}

fn controller(i: usize) -> String {
    format!(
        "package com.bench.web;\n\
         import com.bench.service.Entity{i}Service;\n\
         import org.springframework.web.bind.annotation.*;\n\
         @RestController\n@RequestMapping(\"/api/entity{i}\")\n\
         public class Entity{i}Controller {{\n\
         \x20   private Entity{i}Service service;\n\
         \x20   @GetMapping(\"/{{id}}\")\n\
         \x20   public Object get(@PathVariable Long id) {{ return service.find(id); }}\n\
         }}\n"
    )
}

fn service(i: usize, count: usize) -> String {
    let next = if i + 1 < count {
        format!(
            "    private Entity{n}Service next;\n\
             \x20   public Object find(Long id) {{ next.find(id); return mapper.selectById(id); }}\n",
            n = i + 1
        )
    } else {
        "    public Object find(Long id) { return mapper.selectById(id); }\n".to_string()
    };
    format!(
        "package com.bench.service;\n\
         import com.bench.mapper.Entity{i}Mapper;\n\
         import org.springframework.stereotype.Service;\n\
         @Service\npublic class Entity{i}Service {{\n\
         \x20   private Entity{i}Mapper mapper;\n{next}}}\n"
    )
}

fn mapper_interface(i: usize) -> String {
    format!(
        "package com.bench.mapper;\n\
         public interface Entity{i}Mapper {{\n    Object selectById(Long id);\n}}\n"
    )
}

fn mapper_xml(i: usize) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <mapper namespace=\"com.bench.mapper.Entity{i}Mapper\">\n\
         \x20 <select id=\"selectById\">\n\
         \x20   SELECT e.id, e.name, e.updated_at FROM entity_{i} e WHERE e.id = #{{id}}\n\
         \x20 </select>\n\
         </mapper>\n"
    )
}

pub fn synthetic_project(count: usize) -> SyntheticProject {
    let mut java = Vec::with_capacity(count * 3);
    let mut mappers = Vec::with_capacity(count);
    for i in 0..count {
        java.push((format!("web/Entity{i}Controller.java"), controller(i)));
        java.push((format!("service/Entity{i}Service.java"), service(i, count)));
        java.push((format!("mapper/Entity{i}Mapper.java"), mapper_interface(i)));
        mappers.push((format!("mapper/Entity{i}Mapper.xml"), mapper_xml(i)));
    }
    SyntheticProject { java, mappers }
}
