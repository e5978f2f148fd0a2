//! Per-scope extraction of compile configuration every target shares.

use crate::target::Target;
use salvage_command::Command;
use salvage_common::{OrderedMap, OrderedSet};
use serde::Serialize;

/// Configuration lifted out of the compiled targets of one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommonConfig {
    pub includes: Vec<String>,
    pub system_includes: Vec<String>,
    pub iquote_includes: Vec<String>,
    pub options: Vec<String>,
    pub definitions: Vec<String>,
}

impl CommonConfig {
    pub fn is_empty(&self) -> bool {
        ConfigList::ALL.iter().all(|list| list.of_config(self).is_empty())
    }
}

#[derive(Debug, Clone, Copy)]
enum ConfigList {
    Includes,
    SystemIncludes,
    IquoteIncludes,
    Options,
    Definitions,
}

impl ConfigList {
    const ALL: [ConfigList; 5] = [
        ConfigList::Includes,
        ConfigList::SystemIncludes,
        ConfigList::IquoteIncludes,
        ConfigList::Options,
        ConfigList::Definitions,
    ];

    fn of(self, command: &Command) -> &Vec<String> {
        match self {
            ConfigList::Includes => &command.includes,
            ConfigList::SystemIncludes => &command.system_includes,
            ConfigList::IquoteIncludes => &command.iquote_includes,
            ConfigList::Options => &command.options,
            ConfigList::Definitions => &command.definitions,
        }
    }

    fn of_mut(self, command: &mut Command) -> &mut Vec<String> {
        match self {
            ConfigList::Includes => &mut command.includes,
            ConfigList::SystemIncludes => &mut command.system_includes,
            ConfigList::IquoteIncludes => &mut command.iquote_includes,
            ConfigList::Options => &mut command.options,
            ConfigList::Definitions => &mut command.definitions,
        }
    }

    fn of_config(self, config: &CommonConfig) -> &Vec<String> {
        match self {
            ConfigList::Includes => &config.includes,
            ConfigList::SystemIncludes => &config.system_includes,
            ConfigList::IquoteIncludes => &config.iquote_includes,
            ConfigList::Options => &config.options,
            ConfigList::Definitions => &config.definitions,
        }
    }

    fn of_config_mut(self, config: &mut CommonConfig) -> &mut Vec<String> {
        match self {
            ConfigList::Includes => &mut config.includes,
            ConfigList::SystemIncludes => &mut config.system_includes,
            ConfigList::IquoteIncludes => &mut config.iquote_includes,
            ConfigList::Options => &mut config.options,
            ConfigList::Definitions => &mut config.definitions,
        }
    }
}

/// Remove, per scope, the values every Executable/Library target with a
/// non-empty list shares, and return them keyed by scope.
pub fn hoist_common_config(targets: &mut [Target]) -> OrderedMap<String, CommonConfig> {
    let scopes: OrderedSet<String> = targets
        .iter()
        .filter(|t| t.kind.is_compiled() && t.command.is_some())
        .map(|t| t.scope.clone())
        .collect();

    let mut hoisted = OrderedMap::new();
    for scope in scopes {
        let mut common = CommonConfig::default();
        for list in ConfigList::ALL {
            let shared = shared_values(targets, &scope, list);
            if shared.is_empty() {
                continue;
            }
            for command in scoped_commands(targets, &scope) {
                list.of_mut(command).retain(|value| !shared.contains(value));
            }
            *list.of_config_mut(&mut common) = shared;
        }
        if !common.is_empty() {
            tracing::debug!("Hoisted common configuration of {}: {:?}", scope, common);
            hoisted.insert(scope, common);
        }
    }
    hoisted
}

fn scoped_commands<'t>(targets: &'t mut [Target], scope: &'t str) -> impl Iterator<Item = &'t mut Command> {
    targets
        .iter_mut()
        .filter(move |t| t.kind.is_compiled() && t.scope == scope)
        .filter_map(|t| t.command.as_mut())
}

fn shared_values(targets: &[Target], scope: &str, list: ConfigList) -> Vec<String> {
    let mut lists = targets
        .iter()
        .filter(|t| t.kind.is_compiled() && t.scope == scope)
        .filter_map(|t| t.command.as_ref())
        .map(|command| list.of(command))
        .filter(|values| !values.is_empty());

    let Some(first) = lists.next() else {
        return Vec::new();
    };
    let mut shared = first.clone();
    for values in lists {
        shared.retain(|value| values.contains(value));
    }
    shared
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{LibraryType, TargetKind};
    use salvage_command::Linkage;

    fn compiled(name: &str, scope: &str, includes: &[&str], definitions: &[&str]) -> Target {
        let mut command = Command::new("cc", scope, Linkage::Executable);
        command.includes = includes.iter().map(|s| s.to_string()).collect();
        command.definitions = definitions.iter().map(|s| s.to_string()).collect();
        Target::new(TargetKind::Executable, name, scope).with_command(command)
    }

    #[test]
    fn test_shared_values_are_hoisted_per_scope() {
        let mut targets = vec![
            compiled("gdb", "/git/gdb/gdb", &["/git/gdb/include", "/git/gdb/gdb"], &["HAVE_CONFIG_H"]),
            compiled("gcore", "/git/gdb/gdb", &["/git/gdb/include"], &["HAVE_CONFIG_H", "GCORE"]),
            compiled("bfd", "/git/gdb/bfd", &["/git/gdb/bfd"], &[]),
        ];
        targets[2].kind = TargetKind::Library(LibraryType::Static);

        let hoisted = hoist_common_config(&mut targets);

        let gdb_scope = &hoisted["/git/gdb/gdb"];
        assert_eq!(gdb_scope.includes, vec!["/git/gdb/include"]);
        assert_eq!(gdb_scope.definitions, vec!["HAVE_CONFIG_H"]);
        assert!(gdb_scope.options.is_empty());

        let gdb = targets[0].command.as_ref().unwrap();
        assert_eq!(gdb.includes, vec!["/git/gdb/gdb"]);
        assert!(gdb.definitions.is_empty());
        let gcore = targets[1].command.as_ref().unwrap();
        assert!(gcore.includes.is_empty());
        assert_eq!(gcore.definitions, vec!["GCORE"]);

        // A lone target gives up everything it has.
        assert_eq!(hoisted["/git/gdb/bfd"].includes, vec!["/git/gdb/bfd"]);
        assert!(targets[2].command.as_ref().unwrap().includes.is_empty());
    }

    #[test]
    fn test_empty_lists_do_not_block_hoisting() {
        let mut targets = vec![
            compiled("a", "/p", &["/p/include"], &[]),
            compiled("b", "/p", &["/p/include", "/p/b"], &["B"]),
        ];
        let hoisted = hoist_common_config(&mut targets);

        assert_eq!(hoisted["/p"].includes, vec!["/p/include"]);
        assert_eq!(hoisted["/p"].definitions, vec!["B"]);
        assert!(targets[1].command.as_ref().unwrap().definitions.is_empty());
    }

    #[test]
    fn test_non_compiled_targets_are_ignored() {
        let mut install = compiled("docs", "/p", &["/p/include"], &[]);
        install.kind = TargetKind::CustomCommand;
        let mut targets = vec![install];

        assert!(hoist_common_config(&mut targets).is_empty());
        assert_eq!(targets[0].command.as_ref().unwrap().includes, vec!["/p/include"]);
    }
}
