//! First-fit grouping of (target, source) pairs under shared templates.

use crate::diff::{diff_fields, Field};
use crate::template::{placeholder, Template};
use serde::Serialize;

/// One concrete pair reproduced by its group's templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternMember {
    pub target: String,
    pub source: String,
    /// Captured field values, by placeholder index.
    pub fields: Vec<String>,
}

/// A `(dest_pattern, src_pattern)` template pair and the members it
/// reproduces. A group of one has the literal target as its
/// `dest_pattern` and an empty `src_pattern`.
#[derive(Debug, Clone, Serialize)]
pub struct PatternGroup {
    pub dest_pattern: String,
    pub src_pattern: String,
    pub members: Vec<PatternMember>,
    #[serde(skip)]
    templates: Option<(Template, Template)>,
}

impl PatternGroup {
    fn singleton(target: &str, source: &str) -> Self {
        Self {
            dest_pattern: target.to_string(),
            src_pattern: String::new(),
            members: vec![PatternMember {
                target: target.to_string(),
                source: source.to_string(),
                fields: Vec::new(),
            }],
            templates: None,
        }
    }

    /// Whether the group carries a genuine template.
    pub fn is_parameterized(&self) -> bool {
        self.templates
            .as_ref()
            .is_some_and(|(_, src)| src.is_parameterized())
    }

    fn contains(&self, target: &str, source: &str) -> bool {
        self.members
            .iter()
            .any(|m| m.target == target && m.source == source)
    }

    /// Reproduce `target` from `source` through the current templates.
    fn fast_match(&self, target: &str, source: &str) -> Option<Vec<String>> {
        let (dest, src) = self.templates.as_ref()?;
        let fields = src.capture(source)?;
        (dest.substitute(&fields)? == target).then_some(fields)
    }
}

/// Template inference over a stream of pairs known to share one rule.
///
/// Groups are tried in creation order and the first one that accepts a
/// pair keeps it, so the outcome depends on input order.
#[derive(Debug, Clone)]
pub struct PatternEngine {
    max_fields: usize,
    groups: Vec<PatternGroup>,
}

impl Default for PatternEngine {
    fn default() -> Self {
        Self::new(1)
    }
}

impl PatternEngine {
    pub fn new(max_fields: usize) -> Self {
        Self {
            max_fields: max_fields.max(1),
            groups: Vec::new(),
        }
    }

    pub fn groups(&self) -> &[PatternGroup] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<PatternGroup> {
        self.groups
    }

    /// Add one pair. Returns the index of the group that took it.
    pub fn add(&mut self, target: &str, source: &str) -> usize {
        if let Some(index) = self.groups.iter().position(|g| g.contains(target, source)) {
            return index;
        }

        for (index, group) in self.groups.iter_mut().enumerate() {
            if let Some(fields) = group.fast_match(target, source) {
                group.members.push(PatternMember {
                    target: target.to_string(),
                    source: source.to_string(),
                    fields,
                });
                return index;
            }
        }

        for index in 0..self.groups.len() {
            if let Some(widened) = self.generalize(&self.groups[index], target, source) {
                tracing::debug!(
                    "Pattern {} <- {} now covers {} members",
                    widened.dest_pattern,
                    widened.src_pattern,
                    widened.members.len()
                );
                self.groups[index] = widened;
                return index;
            }
        }

        self.groups.push(PatternGroup::singleton(target, source));
        self.groups.len() - 1
    }

    /// Diff the group's prototype against the new pair and build the
    /// template both sides imply. The result must reproduce every member
    /// and the new pair, or the group keeps its old templates.
    fn generalize(&self, group: &PatternGroup, target: &str, source: &str) -> Option<PatternGroup> {
        let proto = group.members.first()?;

        let proto_src: Vec<char> = proto.source.chars().collect();
        let new_src: Vec<char> = source.chars().collect();
        let src_fields = diff_fields(&proto_src, &new_src);
        if src_fields.is_empty() || src_fields.len() > self.max_fields {
            return None;
        }

        let proto_dest: Vec<char> = proto.target.chars().collect();
        let new_dest: Vec<char> = target.chars().collect();
        let dest_fields = diff_fields(&proto_dest, &new_dest);

        let src_values: Vec<(String, String)> = src_fields
            .iter()
            .map(|f| field_text(f, &proto_src, &new_src))
            .collect();
        let mut dest_indices = Vec::with_capacity(dest_fields.len());
        for field in &dest_fields {
            let value = field_text(field, &proto_dest, &new_dest);
            dest_indices.push(src_values.iter().position(|v| *v == value)?);
        }

        let src_indices: Vec<usize> = (0..src_fields.len()).collect();
        let src_pattern = render(&proto_src, &src_fields, &src_indices);
        let dest_pattern = render(&proto_dest, &dest_fields, &dest_indices);
        let src = Template::new(&src_pattern).ok()?;
        let dest = Template::new(&dest_pattern).ok()?;

        let mut members = Vec::with_capacity(group.members.len() + 1);
        let pairs = group
            .members
            .iter()
            .map(|m| (m.target.as_str(), m.source.as_str()))
            .chain(std::iter::once((target, source)));
        for (member_target, member_source) in pairs {
            let fields = src.capture(member_source)?;
            if dest.substitute(&fields)? != member_target {
                return None;
            }
            members.push(PatternMember {
                target: member_target.to_string(),
                source: member_source.to_string(),
                fields,
            });
        }

        Some(PatternGroup {
            dest_pattern,
            src_pattern,
            members,
            templates: Some((dest, src)),
        })
    }
}

fn field_text(field: &Field, old: &[char], new: &[char]) -> (String, String) {
    (
        old[field.old.clone()].iter().collect(),
        new[field.new.clone()].iter().collect(),
    )
}

/// `text` with each field's old range replaced by its placeholder.
fn render(text: &[char], fields: &[Field], indices: &[usize]) -> String {
    let mut out = String::new();
    let mut last = 0;
    for (field, index) in fields.iter().zip(indices) {
        out.extend(&text[last..field.old.start]);
        out.push_str(&placeholder(*index));
        last = field.old.end;
    }
    out.extend(&text[last..]);
    out
}

/// Run a batch of `(target, source)` pairs through a fresh engine.
pub fn infer_groups<'a, I>(pairs: I, max_fields: usize) -> Vec<PatternGroup>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut engine = PatternEngine::new(max_fields);
    for (target, source) in pairs {
        engine.add(target, source);
    }
    engine.into_groups()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCALES: &[&str] = &["ar_SA", "ay_WI", "be_BY", "be_BY@latin"];

    fn locale_pair(code: &str) -> (String, String) {
        (
            format!("/usr/local/share/goldendict/locale/{}.qm", code),
            format!("/git/goldendict/locale/{}.qm", code),
        )
    }

    fn assert_round_trip(group: &PatternGroup) {
        let dest = Template::new(&group.dest_pattern).unwrap();
        let src = Template::new(&group.src_pattern).unwrap();
        for member in &group.members {
            assert_eq!(dest.substitute(&member.fields).as_deref(), Some(member.target.as_str()));
            assert_eq!(src.substitute(&member.fields).as_deref(), Some(member.source.as_str()));
        }
    }

    fn first_fields(group: &PatternGroup) -> Vec<&str> {
        group
            .members
            .iter()
            .filter_map(|m| m.fields.first().map(String::as_str))
            .collect()
    }

    #[test]
    fn test_locale_family_forms_one_group() {
        let pairs: Vec<(String, String)> = LOCALES.iter().map(|c| locale_pair(c)).collect();
        let groups = infer_groups(pairs.iter().map(|(t, s)| (t.as_str(), s.as_str())), 1);

        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert!(group.is_parameterized());
        assert_eq!(group.src_pattern, "/git/goldendict/locale/%(0)s.qm");
        assert_eq!(group.dest_pattern, "/usr/local/share/goldendict/locale/%(0)s.qm");
        assert_eq!(first_fields(group), LOCALES);
        assert_round_trip(group);
    }

    #[test]
    fn test_program_install_pattern() {
        let groups = infer_groups(
            [
                ("/usr/local/bin/x86_64-pc-linux-gdb", "/git/gdb/gdb"),
                ("/usr/local/bin/x86_64-pc-linux-gcore", "/git/gdb/gcore"),
            ],
            1,
        );

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].dest_pattern, "/usr/local/bin/x86_64-pc-linux-%(0)s");
        assert_eq!(groups[0].src_pattern, "/git/gdb/%(0)s");
        assert_eq!(first_fields(&groups[0]), vec!["gdb", "gcore"]);
        assert_round_trip(&groups[0]);
    }

    #[test]
    fn test_independent_destination_is_rejected() {
        let mut engine = PatternEngine::new(1);
        let first = engine.add("/usr/local/share/man/man1/gdb.1", "/git/gdb/doc/gdb.1");
        let second = engine.add("/usr/local/share/man/man5/gdbinit.5", "/git/gdb/doc/gdbinit.5");

        assert_ne!(first, second);
        let groups = engine.groups();
        assert_eq!(groups.len(), 2);
        assert!(!groups[0].is_parameterized());
        assert_eq!(groups[1].dest_pattern, "/usr/local/share/man/man5/gdbinit.5");
        assert_eq!(groups[1].src_pattern, "");
    }

    #[test]
    fn test_field_limit() {
        let pairs = [("/d/a/share/x.txt", "/s/a/doc/x.txt"), ("/d/b/share/y.txt", "/s/b/doc/y.txt")];

        assert_eq!(infer_groups(pairs, 1).len(), 2);

        let groups = infer_groups(pairs, 2);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].src_pattern, "/s/%(0)s/doc/%(1)s.txt");
        assert_eq!(groups[0].dest_pattern, "/d/%(0)s/share/%(1)s.txt");
        assert_eq!(groups[0].members[1].fields, vec!["b", "y"]);
    }

    #[test]
    fn test_same_source_to_two_destinations() {
        let groups = infer_groups(
            [("/usr/bin/gdb", "/git/gdb/gdb"), ("/opt/bin/gdb", "/git/gdb/gdb")],
            1,
        );
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_duplicate_pair_is_absorbed() {
        let mut engine = PatternEngine::default();
        let a = engine.add("/usr/bin/gdb", "/git/gdb/gdb");
        let b = engine.add("/usr/bin/gdb", "/git/gdb/gdb");
        assert_eq!(a, b);
        assert_eq!(engine.groups()[0].members.len(), 1);
    }
}
