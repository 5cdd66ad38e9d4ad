//! Token based table and column extraction.
//!
//! This is not a SQL grammar. Statements are normalized, tokenized and
//! annotated with paren depth, sub-query scope and the clause each token
//! belongs to; tables and columns are then picked by position relative to
//! keywords. Dynamic SQL whose branches were unioned by the mapper reader
//! produces text no database would accept, which is fine here: the aim is
//! completeness, and false positives are expected.

use ir::{ColumnRef, ColumnUsage};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
static BLOCK_COMMENT_RE: OnceLock<Regex> = OnceLock::new();
static LINE_COMMENT_RE: OnceLock<Regex> = OnceLock::new();

fn re(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("valid sql regex"))
}

const KEYWORDS: &[&str] = &[
    "ALL", "AND", "AS", "ASC", "BETWEEN", "BY", "CASE", "CONNECT", "CROSS", "CURRENT_DATE",
    "CURRENT_TIMESTAMP", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DUAL", "DUPLICATE", "ELSE",
    "END", "ESCAPE", "EXCEPT", "EXISTS", "FALSE", "FETCH", "FIRST", "FOR", "FROM", "FULL",
    "GROUP", "HAVING", "IGNORE", "IN", "INNER", "INSERT", "INTERSECT", "INTERVAL", "INTO", "IS",
    "JOIN", "LATERAL", "LEFT", "LIKE", "LIMIT", "MATCHED", "MERGE", "MINUS", "NATURAL", "NEXT",
    "NOT", "NOWAIT", "NULL", "NULLS", "OF", "OFFSET", "ON", "ONLY", "OR", "ORDER", "OUTER",
    "OVER", "PARTITION", "PRIOR", "RETURNING", "RIGHT", "ROWNUM", "ROWS", "SELECT", "SET",
    "START", "SYSDATE", "SYSTIMESTAMP", "THEN", "TOP", "TRUE", "UNION", "UPDATE", "USING",
    "VALUES", "WHEN", "WHERE", "WITH",
];

/// Keywords that open a clause; every following token of the same scope
/// belongs to it until the next one.
const CLAUSES: &[&str] = &[
    "SELECT", "FROM", "WHERE", "SET", "ON", "HAVING", "GROUP", "ORDER", "VALUES", "INTO",
    "UPDATE", "JOIN", "LIMIT", "USING", "UNION", "RETURNING",
];

const TABLE_KEYWORDS: &[&str] = &["FROM", "JOIN", "INTO", "UPDATE", "USING"];

const SELECT_LIST_END: &[&str] = &[
    "FROM", "INTO", "WHERE", "GROUP", "ORDER", "HAVING", "UNION", "LIMIT", "INTERSECT", "EXCEPT",
    "MINUS",
];

const COMPARISONS: &[&str] = &["=", "<>", "!=", "<", ">", "<=", ">="];
const WORD_PREDICATES: &[&str] = &["LIKE", "IN", "IS", "BETWEEN"];

/// Tables and columns referenced by one statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlShape {
    /// Lowercase names without schema, in order of first appearance.
    pub tables: Vec<String>,
    pub columns: Vec<ColumnRef>,
}

/// Replaces MyBatis parameters with `?`, drops comments and collapses
/// whitespace.
///
/// # Example
/// ```
/// use engine::sql::normalize_sql;
/// assert_eq!(
///     normalize_sql("SELECT *  -- all\nFROM t WHERE id = #{id, jdbcType=BIGINT}"),
///     "SELECT * FROM t WHERE id = ?"
/// );
/// ```
pub fn normalize_sql(sql: &str) -> String {
    let s = re(&BLOCK_COMMENT_RE, r"(?s)/\*.*?\*/").replace_all(sql, " ");
    let s = re(&LINE_COMMENT_RE, r"--[^\n]*").replace_all(&s, " ");
    let s = re(&PLACEHOLDER_RE, r"[#$]\{[^}]*\}").replace_all(&s, "?");
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Word(String),
    Literal,
    Param,
    Star,
    LParen,
    RParen,
    Comma,
    Op(String),
    Other,
}

impl Tok {
    fn is_kw(&self, kw: &str) -> bool {
        matches!(self, Tok::Word(w) if w.eq_ignore_ascii_case(kw))
    }

    fn is_any_kw(&self, kws: &[&str]) -> bool {
        kws.iter().any(|k| self.is_kw(k))
    }
}

fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '#')
}

fn tokenize(sql: &str) -> Vec<Tok> {
    let chars: Vec<char> = sql.chars().collect();
    let len = chars.len();
    let mut out = Vec::new();
    let mut i = 0;
    while i < len {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '\'' => {
                i += 1;
                while i < len {
                    if chars[i] == '\'' {
                        if chars.get(i + 1) == Some(&'\'') {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
                i += 1;
                out.push(Tok::Literal);
            }
            '"' | '`' | '[' => {
                let close = if c == '[' { ']' } else { c };
                let start = i + 1;
                let mut j = start;
                while j < len && chars[j] != close {
                    j += 1;
                }
                out.push(Tok::Word(chars[start..j].iter().collect()));
                i = j + 1;
            }
            c if c.is_ascii_digit() => {
                while i < len && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                    i += 1;
                }
                out.push(Tok::Literal);
            }
            c if is_ident_start(c) => {
                let start = i;
                while i < len
                    && (is_ident_char(chars[i])
                        || (chars[i] == '.' && chars.get(i + 1).is_some_and(|n| is_ident_start(*n))))
                {
                    i += 1;
                }
                if chars.get(i) == Some(&'.') && chars.get(i + 1) == Some(&'*') {
                    // qualified star: t.*
                    i += 2;
                    out.push(Tok::Star);
                } else {
                    out.push(Tok::Word(chars[start..i].iter().collect()));
                }
            }
            '?' => {
                i += 1;
                out.push(Tok::Param);
            }
            ':' if chars.get(i + 1).is_some_and(|n| is_ident_start(*n)) => {
                i += 1;
                while i < len && is_ident_char(chars[i]) {
                    i += 1;
                }
                out.push(Tok::Param);
            }
            '(' => {
                i += 1;
                out.push(Tok::LParen);
            }
            ')' => {
                i += 1;
                out.push(Tok::RParen);
            }
            ',' => {
                i += 1;
                out.push(Tok::Comma);
            }
            '*' => {
                i += 1;
                out.push(Tok::Star);
            }
            '<' | '>' | '!' | '=' => {
                let pair: String = chars[i..(i + 2).min(len)].iter().collect();
                if matches!(pair.as_str(), "<>" | "<=" | ">=" | "!=") {
                    i += 2;
                    out.push(Tok::Op(pair));
                } else if c == '!' {
                    i += 1;
                    out.push(Tok::Other);
                } else {
                    i += 1;
                    out.push(Tok::Op(c.to_string()));
                }
            }
            '+' | '-' | '/' | '%' | '|' => {
                i += 1;
                out.push(Tok::Op(c.to_string()));
            }
            _ => {
                i += 1;
                out.push(Tok::Other);
            }
        }
    }
    out
}

struct Lexeme {
    tok: Tok,
    depth: usize,
    scope: usize,
    clause: &'static str,
}

/// Tokens annotated with their position in the statement structure. A scope
/// is the top level query or a parenthesized sub-query; parens that are not
/// sub-queries (function calls, value lists) keep the enclosing scope.
struct Annotated {
    lex: Vec<Lexeme>,
    scope_depth: HashMap<usize, usize>,
}

fn annotate(tokens: Vec<Tok>) -> Annotated {
    let mut lex = Vec::with_capacity(tokens.len());
    let mut scope_depth = HashMap::from([(0usize, 0usize)]);
    let mut clause: HashMap<usize, &'static str> = HashMap::new();
    let mut parens: Vec<bool> = Vec::new();
    let mut scopes = vec![0usize];
    let mut depth = 0usize;
    let mut next_scope = 1usize;
    for k in 0..tokens.len() {
        let tok = tokens[k].clone();
        let current = scopes.last().copied().unwrap_or(0);
        match &tok {
            Tok::LParen => {
                let is_query = tokens
                    .get(k + 1)
                    .is_some_and(|t| t.is_kw("SELECT") || t.is_kw("WITH"));
                lex.push(Lexeme {
                    tok,
                    depth,
                    scope: current,
                    clause: clause.get(&current).copied().unwrap_or(""),
                });
                depth += 1;
                parens.push(is_query);
                if is_query {
                    scopes.push(next_scope);
                    scope_depth.insert(next_scope, depth);
                    next_scope += 1;
                }
            }
            Tok::RParen => {
                if parens.pop() == Some(true) && scopes.len() > 1 {
                    scopes.pop();
                }
                depth = depth.saturating_sub(1);
                let scope = scopes.last().copied().unwrap_or(0);
                lex.push(Lexeme {
                    tok,
                    depth,
                    scope,
                    clause: clause.get(&scope).copied().unwrap_or(""),
                });
            }
            Tok::Word(w) => {
                if let Some(c) = CLAUSES.iter().find(|c| c.eq_ignore_ascii_case(w)) {
                    clause.insert(current, c);
                }
                lex.push(Lexeme {
                    tok,
                    depth,
                    scope: current,
                    clause: clause.get(&current).copied().unwrap_or(""),
                });
            }
            _ => lex.push(Lexeme {
                tok,
                depth,
                scope: current,
                clause: clause.get(&current).copied().unwrap_or(""),
            }),
        }
    }
    Annotated { lex, scope_depth }
}

struct Collector {
    tables: Vec<String>,
    aliases: HashMap<String, String>,
    columns: BTreeMap<(String, Option<String>), ColumnUsage>,
}

impl Collector {
    fn add_table(&mut self, raw: &str) -> Option<String> {
        let name = raw.rsplit('.').next().unwrap_or(raw).to_lowercase();
        if name.is_empty() || name == "dual" {
            return None;
        }
        if !self.tables.contains(&name) {
            self.tables.push(name.clone());
        }
        self.aliases.insert(name.clone(), name.clone());
        Some(name)
    }

    fn resolve(&self, qualifier: &str) -> Option<String> {
        let q = qualifier.rsplit('.').next().unwrap_or(qualifier).to_lowercase();
        self.aliases.get(&q).cloned()
    }

    fn add_column(&mut self, word: &str, usage: ColumnUsage) {
        let (qualifier, name) = match word.rsplit_once('.') {
            Some((q, n)) => (Some(q), n),
            None => (None, word),
        };
        if name.is_empty() || is_keyword(name) {
            return;
        }
        let table = qualifier.and_then(|q| self.resolve(q));
        self.columns
            .entry((name.to_lowercase(), table))
            .and_modify(|u| *u = u.merge(usage))
            .or_insert(usage);
    }
}

impl Annotated {
    fn tok(&self, k: usize) -> Option<&Tok> {
        self.lex.get(k).map(|l| &l.tok)
    }

    fn in_function(&self, k: usize) -> bool {
        let l = &self.lex[k];
        self.scope_depth.get(&l.scope).copied().unwrap_or(0) != l.depth
    }

    fn matching_close(&self, open: usize) -> usize {
        let mut level = 0usize;
        for k in open..self.lex.len() {
            match self.lex[k].tok {
                Tok::LParen => level += 1,
                Tok::RParen => {
                    level = level.saturating_sub(1);
                    if level == 0 {
                        return k;
                    }
                }
                _ => {}
            }
        }
        self.lex.len()
    }

    /// A word naming a column: not a keyword, not a function name.
    fn column_word(&self, k: usize) -> Option<&str> {
        match self.tok(k)? {
            Tok::Word(w) if !is_keyword(w) && self.tok(k + 1) != Some(&Tok::LParen) => Some(w),
            _ => None,
        }
    }

    fn tables(&self, c: &mut Collector) {
        for k in 0..self.lex.len() {
            let tok = &self.lex[k].tok;
            if tok.is_kw("DELETE") {
                if let Some(Tok::Word(w)) = self.tok(k + 1) {
                    if !is_keyword(w) {
                        c.add_table(w);
                    }
                }
                continue;
            }
            if !tok.is_any_kw(TABLE_KEYWORDS) || self.in_function(k) {
                continue;
            }
            if tok.is_kw("UPDATE")
                && k > 0
                && self.tok(k - 1).is_some_and(|p| p.is_kw("FOR") || p.is_kw("KEY"))
            {
                continue;
            }
            let is_from = tok.is_kw("FROM");
            let is_into = tok.is_kw("INTO");
            let mut j = k + 1;
            loop {
                let mut table = None;
                match self.tok(j) {
                    Some(Tok::Word(name)) if !is_keyword(name) => {
                        if self.tok(j + 1).is_some_and(|t| *t == Tok::Op("=".into())) {
                            break;
                        }
                        table = c.add_table(name);
                        j += 1;
                    }
                    Some(Tok::LParen) => {
                        // derived table or USING (col)
                        j = self.matching_close(j) + 1;
                    }
                    _ => break,
                }
                match self.tok(j) {
                    Some(Tok::Word(a)) if a.eq_ignore_ascii_case("AS") => {
                        if let (Some(Tok::Word(alias)), Some(t)) = (self.tok(j + 1), &table) {
                            c.aliases.insert(alias.to_lowercase(), t.clone());
                        }
                        j += 2;
                    }
                    Some(Tok::Word(alias)) if !is_keyword(alias) => {
                        if let Some(t) = &table {
                            c.aliases.insert(alias.to_lowercase(), t.clone());
                        }
                        j += 1;
                    }
                    _ => {}
                }
                if is_into && self.tok(j) == Some(&Tok::LParen) {
                    if let Some(t) = &table {
                        self.insert_columns(j, t, c);
                    }
                }
                if is_from && self.tok(j) == Some(&Tok::Comma) {
                    j += 1;
                    continue;
                }
                break;
            }
        }
    }

    fn insert_columns(&self, open: usize, table: &str, c: &mut Collector) {
        if self.tok(open + 1).is_some_and(|t| t.is_kw("SELECT")) {
            return;
        }
        let close = self.matching_close(open);
        for k in open + 1..close {
            if let Some(w) = self.column_word(k) {
                let name = w.rsplit('.').next().unwrap_or(w).to_string();
                c.columns
                    .entry((name.to_lowercase(), Some(table.to_string())))
                    .and_modify(|u| *u = u.merge(ColumnUsage::Write))
                    .or_insert(ColumnUsage::Write);
            }
        }
    }

    /// Token indices of one clause split at top level commas; the clause
    /// starts after `start` and ends at the scope end or at `stop`.
    fn clause_items(&self, start: usize, stop: &[&str]) -> Vec<Vec<usize>> {
        let scope = self.lex[start].scope;
        let depth = self.lex[start].depth;
        let mut items = vec![Vec::new()];
        for k in start + 1..self.lex.len() {
            let l = &self.lex[k];
            if l.depth < depth {
                break;
            }
            if l.scope == scope && l.depth == depth {
                if l.tok.is_any_kw(stop) {
                    break;
                }
                if l.tok == Tok::Comma {
                    items.push(Vec::new());
                    continue;
                }
            }
            if let Some(item) = items.last_mut() {
                item.push(k);
            }
        }
        items.retain(|i| !i.is_empty());
        items
    }

    fn select_lists(&self, c: &mut Collector) {
        for k in 0..self.lex.len() {
            if !self.lex[k].tok.is_kw("SELECT") {
                continue;
            }
            let scope = self.lex[k].scope;
            for mut item in self.clause_items(k, SELECT_LIST_END) {
                self.drop_alias(&mut item);
                for &i in &item {
                    if self.lex[i].scope != scope {
                        continue;
                    }
                    if let Some(w) = self.column_word(i) {
                        c.add_column(w, ColumnUsage::Read);
                    }
                }
            }
        }
    }

    fn drop_alias(&self, item: &mut Vec<usize>) {
        if item.len() < 2 {
            return;
        }
        let last = item[item.len() - 1];
        let prev = item[item.len() - 2];
        let Tok::Word(w) = &self.lex[last].tok else {
            return;
        };
        if is_keyword(w) {
            return;
        }
        match &self.lex[prev].tok {
            t if t.is_kw("AS") => {
                item.truncate(item.len() - 2);
            }
            Tok::Word(p) if !is_keyword(p) => {
                item.pop();
            }
            Tok::RParen | Tok::Literal | Tok::Param => {
                item.pop();
            }
            t if t.is_kw("END") => {
                item.pop();
            }
            _ => {}
        }
    }

    fn set_clauses(&self, c: &mut Collector) {
        for k in 0..self.lex.len() {
            if !self.lex[k].tok.is_kw("SET") {
                continue;
            }
            let scope = self.lex[k].scope;
            let depth = self.lex[k].depth;
            for item in self.clause_items(k, &["WHERE", "FROM", "RETURNING", "WHEN"]) {
                let eq = item
                    .iter()
                    .position(|&i| self.lex[i].depth == depth && self.lex[i].tok == Tok::Op("=".into()));
                let Some(eq) = eq else { continue };
                if let Some(w) = item[..eq].first().and_then(|&i| self.column_word(i)) {
                    c.add_column(w, ColumnUsage::Write);
                }
                for &i in &item[eq + 1..] {
                    if self.lex[i].scope != scope {
                        continue;
                    }
                    if let Some(w) = self.column_word(i) {
                        c.add_column(w, ColumnUsage::Read);
                    }
                }
            }
        }
    }

    fn operand(&self, k: usize, c: &mut Collector) {
        match self.tok(k) {
            Some(Tok::Word(_)) => {
                if let Some(w) = self.column_word(k) {
                    c.add_column(w, ColumnUsage::Read);
                }
            }
            Some(Tok::RParen) => {
                // f(col) = ?: read the words inside the call
                let mut level = 0usize;
                let mut i = k;
                loop {
                    match self.lex[i].tok {
                        Tok::RParen => level += 1,
                        Tok::LParen => {
                            level = level.saturating_sub(1);
                            if level == 0 {
                                break;
                            }
                        }
                        _ => {
                            if let Some(w) = self.column_word(i) {
                                c.add_column(w, ColumnUsage::Read);
                            }
                        }
                    }
                    if i == 0 {
                        break;
                    }
                    i -= 1;
                }
            }
            _ => {}
        }
    }

    fn comparisons(&self, c: &mut Collector) {
        for k in 0..self.lex.len() {
            let l = &self.lex[k];
            if !matches!(l.clause, "WHERE" | "ON" | "HAVING") {
                continue;
            }
            match &l.tok {
                Tok::Op(op) if COMPARISONS.contains(&op.as_str()) => {
                    if k > 0 {
                        self.operand(k - 1, c);
                    }
                    if self.tok(k + 1).is_some_and(|t| matches!(t, Tok::Word(_))) {
                        self.operand(k + 1, c);
                    }
                }
                t if t.is_any_kw(WORD_PREDICATES) && k > 0 => {
                    let left = if self.tok(k - 1).is_some_and(|p| p.is_kw("NOT")) && k > 1 {
                        k - 2
                    } else {
                        k - 1
                    };
                    self.operand(left, c);
                }
                _ => {}
            }
        }
    }
}

/// Extracts the tables and columns of one statement.
///
/// Alias-qualified columns are attributed to the aliased table; unqualified
/// ones carry no table and apply to every table of the statement.
pub fn analyze_sql(sql: &str) -> SqlShape {
    let annotated = annotate(tokenize(&normalize_sql(sql)));
    let mut c = Collector {
        tables: Vec::new(),
        aliases: HashMap::new(),
        columns: BTreeMap::new(),
    };
    annotated.tables(&mut c);
    annotated.select_lists(&mut c);
    annotated.set_clauses(&mut c);
    annotated.comparisons(&mut c);
    let columns = c
        .columns
        .into_iter()
        .map(|((name, table), usage)| ColumnRef { name, usage, table })
        .collect();
    SqlShape {
        tables: c.tables,
        columns,
    }
}
