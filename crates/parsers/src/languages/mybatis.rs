//! MyBatis mapper XML reader.
//!
//! The mapper is treated as text rather than a DOM: statement bodies are cut
//! out with regular expressions and every dynamic tag is flattened, so the
//! SQL of all conditional branches ends up in one string.

use anyhow::{Context, Result};
use ir::{QueryType, SqlStatement};
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

static COMMENT_RE: OnceLock<Regex> = OnceLock::new();
static CDATA_RE: OnceLock<Regex> = OnceLock::new();
static MAPPER_RE: OnceLock<Regex> = OnceLock::new();
static ATTR_RE: OnceLock<Regex> = OnceLock::new();
static FRAGMENT_RE: OnceLock<Regex> = OnceLock::new();
static STATEMENT_RE: OnceLock<Regex> = OnceLock::new();
static INCLUDE_RE: OnceLock<Regex> = OnceLock::new();
static SELECT_KEY_RE: OnceLock<Regex> = OnceLock::new();
static TAG_RE: OnceLock<Regex> = OnceLock::new();
static LINE_COMMENT_RE: OnceLock<Regex> = OnceLock::new();

fn re(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("valid mapper regex"))
}

/// Statements of one mapper file. Tables and columns are left empty; they are
/// filled in by the SQL heuristics downstream.
#[derive(Debug, Clone, Default)]
pub struct ParsedMapper {
    pub namespace: String,
    pub statements: Vec<SqlStatement>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MapperParser;

impl MapperParser {
    pub fn new() -> Self {
        Self
    }

    pub fn read(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("failed to read mapper {}", path.display()))
    }

    pub fn parse(&self, path: &Path) -> Result<ParsedMapper> {
        let content = self.read(path)?;
        Ok(self.parse_str(&path.to_string_lossy(), &content))
    }

    pub fn parse_str(&self, file_path: &str, content: &str) -> ParsedMapper {
        let text = re(&COMMENT_RE, r"(?s)<!--.*?-->").replace_all(content, "");
        // CDATA content may hold `<` and `>`; escape it so tag stripping
        // leaves it alone, entities are decoded at the end.
        let text = re(&CDATA_RE, r"(?s)<!\[CDATA\[(.*?)\]\]>")
            .replace_all(&text, |c: &Captures| escape(&c[1]));

        let namespace = re(&MAPPER_RE, r#"<mapper\b((?:[^>"']|"[^"]*"|'[^']*')*)>"#)
            .captures(&text)
            .and_then(|c| attributes(&c[1]).remove("namespace"))
            .unwrap_or_default();

        let mut fragments = HashMap::new();
        for c in re(&FRAGMENT_RE, r#"(?s)<sql\b((?:[^>"']|"[^"]*"|'[^']*')*)>(.*?)</sql\s*>"#).captures_iter(&text) {
            if let Some(id) = attributes(&c[1]).remove("id") {
                fragments.entry(id).or_insert_with(|| c[2].to_string());
            }
        }

        let mut statements: Vec<SqlStatement> = Vec::new();
        let mut seen = HashSet::new();
        let statement_re = re(
            &STATEMENT_RE,
            r#"(?s)<(select|insert|update|delete)\b((?:[^>"']|"[^"]*"|'[^']*')*)>(.*?)</(?:select|insert|update|delete)\s*>"#,
        );
        for c in statement_re.captures_iter(&text) {
            let mut attrs = attributes(&c[2]);
            let Some(id) = attrs.remove("id") else {
                warn!(file = %file_path, tag = &c[1], "Mapper statement without id");
                continue;
            };
            if !seen.insert(id.clone()) {
                warn!(file = %file_path, statement = %id, "Duplicate statement id, keeping the first");
                continue;
            }
            let Ok(query_type) = c[1].parse::<QueryType>() else {
                continue;
            };
            let mut stack = Vec::new();
            let body = inline_includes(&c[3], &namespace, &fragments, &mut stack);
            let body = re(&SELECT_KEY_RE, r"(?s)<selectKey\b.*?</selectKey\s*>").replace_all(&body, " ");
            let body = re(&LINE_COMMENT_RE, r"--[^\n]*").replace_all(&body, " ");
            let sql = collapse(&unescape(&flatten_tags(&body)));
            statements.push(SqlStatement {
                id,
                namespace: namespace.clone(),
                query_type,
                sql,
                parameter_type: attrs.remove("parameterType"),
                result_type: attrs.remove("resultType").or_else(|| attrs.remove("resultMap")),
                tables: Vec::new(),
                columns: Vec::new(),
                file_path: file_path.to_string(),
                owner: None,
            });
        }
        debug!(file = %file_path, namespace = %namespace, statements = statements.len(), "Mapper parsed");
        ParsedMapper {
            namespace,
            statements,
        }
    }
}

fn attributes(raw: &str) -> HashMap<String, String> {
    re(&ATTR_RE, r#"([\w:.-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .captures_iter(raw)
        .map(|c| {
            let value = c.get(2).or_else(|| c.get(3)).map_or("", |m| m.as_str());
            (c[1].to_string(), value.trim().to_string())
        })
        .collect()
}

/// Replaces `<include refid>` with the referenced `<sql>` fragment. `stack`
/// holds the fragments being expanded; a reference back into it expands to
/// nothing.
fn inline_includes(
    body: &str,
    namespace: &str,
    fragments: &HashMap<String, String>,
    stack: &mut Vec<String>,
) -> String {
    let include_re = re(&INCLUDE_RE, r#"(?s)<include\b((?:[^>"']|"[^"]*"|'[^']*')*?)(?:/>|>.*?</include\s*>)"#);
    let mut out = String::with_capacity(body.len());
    let mut last = 0;
    for c in include_re.captures_iter(body) {
        let Some(whole) = c.get(0) else { continue };
        out.push_str(&body[last..whole.start()]);
        last = whole.end();
        let Some(refid) = attributes(&c[1]).remove("refid") else {
            continue;
        };
        let local = refid
            .strip_prefix(namespace)
            .and_then(|r| r.strip_prefix('.'))
            .filter(|_| !namespace.is_empty())
            .unwrap_or(&refid)
            .to_string();
        if stack.contains(&local) {
            warn!(fragment = %local, "Recursive <include> ignored");
            continue;
        }
        match fragments.get(&local) {
            Some(fragment) => {
                stack.push(local);
                out.push(' ');
                out.push_str(&inline_includes(fragment, namespace, fragments, stack));
                out.push(' ');
                stack.pop();
            }
            None => debug!(refid = %refid, "Unknown <sql> fragment"),
        }
    }
    out.push_str(&body[last..]);
    out
}

/// Drops markup, keeping the keywords that `<where>`, `<set>` and `<trim>`
/// contribute to the statement.
fn flatten_tags(body: &str) -> String {
    re(&TAG_RE, r#"<(/?)([\w:-]+)((?:[^>"']|"[^"]*"|'[^']*')*?)/?>"#)
        .replace_all(body, |c: &Captures| {
            if !c[1].is_empty() {
                return " ".to_string();
            }
            match &c[2] {
                "where" => " WHERE ".to_string(),
                "set" => " SET ".to_string(),
                "trim" => {
                    let prefix = attributes(&c[3]).remove("prefix").unwrap_or_default();
                    format!(" {prefix} ")
                }
                _ => " ".to_string(),
            }
        })
        .into_owned()
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER_MAPPER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE mapper PUBLIC "-//mybatis.org//DTD Mapper 3.0//EN" "http://mybatis.org/dtd/mybatis-3-mapper.dtd">
<mapper namespace="com.shop.mapper.UserMapper">
  <sql id="cols">id, name, email</sql>
  <!-- <select id="commented">SELECT * FROM ghost</select> -->
  <select id="findById" parameterType="long" resultType="User">
    SELECT <include refid="cols"/> FROM users WHERE id = #{id}
  </select>
  <select id="search" resultMap="userMap">
    SELECT <include refid="com.shop.mapper.UserMapper.cols"/> FROM users
    <where>
      <if test="name != null">AND name LIKE #{name}</if>
      <if test="minAge != null"><![CDATA[ AND age >= #{minAge} ]]></if>
    </where>
  </select>
  <insert id="insert">
    <selectKey keyProperty="id" order="BEFORE" resultType="long">SELECT seq.nextval FROM dual</selectKey>
    INSERT INTO users (id, name) VALUES (#{id}, #{name})
  </insert>
  <update id="rename">
    UPDATE users <set><if test="name != null">name = #{name},</if></set> WHERE id = #{id}
  </update>
  <delete id="findById">DELETE FROM users</delete>
</mapper>"#;

    fn parsed() -> ParsedMapper {
        MapperParser::new().parse_str("UserMapper.xml", USER_MAPPER)
    }

    #[test]
    fn reads_namespace_and_statements() {
        let m = parsed();
        assert_eq!(m.namespace, "com.shop.mapper.UserMapper");
        let ids: Vec<_> = m.statements.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["findById", "search", "insert", "rename"]);
        assert_eq!(m.statements[0].query_type, QueryType::Select);
        assert_eq!(m.statements[0].parameter_type.as_deref(), Some("long"));
        assert_eq!(m.statements[1].result_type.as_deref(), Some("userMap"));
        assert_eq!(m.statements[0].qualified_id(), "com.shop.mapper.UserMapper.findById");
    }

    #[test]
    fn inlines_fragments_and_flattens_dynamic_sql() {
        let m = parsed();
        assert_eq!(
            m.statements[0].sql,
            "SELECT id, name, email FROM users WHERE id = #{id}"
        );
        let search = &m.statements[1].sql;
        assert!(search.contains("id, name, email FROM users"));
        assert!(search.contains("WHERE AND name LIKE #{name}"));
        assert!(search.contains("age >= #{minAge}"));
        assert!(m.statements[3].sql.starts_with("UPDATE users SET name = #{name},"));
    }

    #[test]
    fn drops_select_key() {
        let insert = &parsed().statements[2];
        assert!(!insert.sql.to_lowercase().contains("dual"));
        assert!(insert.sql.starts_with("INSERT INTO users"));
    }

    #[test]
    fn recursive_include_terminates() {
        let xml = r#"<mapper namespace="a.B">
            <sql id="x">x1 <include refid="y"/></sql>
            <sql id="y">y1 <include refid="x"/></sql>
            <select id="q">SELECT <include refid="x"/> FROM t</select>
        </mapper>"#;
        let m = MapperParser::new().parse_str("B.xml", xml);
        assert_eq!(m.statements[0].sql, "SELECT x1 y1 FROM t");
    }

    #[test]
    fn greater_than_inside_test_attribute_stays_in_the_tag() {
        let xml = r#"<mapper namespace="com.shop.mapper.OrderMapper">
            <select id="search" resultType="Order">
                SELECT o.id FROM orders o
                <if test="ids != null and ids.size() > 0"> JOIN users u ON u.id = o.user_id </if>
                <where><if test='status != null and total >= 0'>AND o.status = #{status}</if></where>
            </select>
        </mapper>"#;
        let m = MapperParser::new().parse_str("OrderMapper.xml", xml);
        assert_eq!(m.statements.len(), 1);
        assert_eq!(
            m.statements[0].sql,
            "SELECT o.id FROM orders o JOIN users u ON u.id = o.user_id WHERE AND o.status = #{status}"
        );
    }

    #[test]
    fn greater_than_in_statement_and_include_attributes() {
        let xml = r#"<mapper namespace="a.B">
            <sql id="cols" lang="x>y">id, name</sql>
            <select id="q" databaseId="a>b">SELECT <include refid="cols" note="1>0"/> FROM t</select>
        </mapper>"#;
        let m = MapperParser::new().parse_str("B.xml", xml);
        assert_eq!(m.namespace, "a.B");
        assert_eq!(m.statements[0].id, "q");
        assert_eq!(m.statements[0].sql, "SELECT id, name FROM t");
    }
}
