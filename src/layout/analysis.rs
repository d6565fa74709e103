//! Relationship analysis and grouping of tables.

use std::collections::{HashSet, VecDeque};

use crate::schema::Table;

use super::types::{Group, GroupingStrategy};

/// True when the table owns a foreign key or another table references it.
pub fn has_relationship(table: &Table, all_tables: &[Table]) -> bool {
    if !table.foreign_keys.is_empty() {
        return true;
    }

    all_tables
        .iter()
        .any(|other| other.table_name != table.table_name && other.references(&table.table_name))
}

/// Partition tables into (related, unrelated), preserving input order.
pub fn partition_tables(all_tables: &[Table]) -> (Vec<&Table>, Vec<&Table>) {
    all_tables
        .iter()
        .partition(|t| has_relationship(t, all_tables))
}

/// Group tables for layout. Related groups come first in input order; isolated tables, if
/// any, form one trailing group with no main table.
pub fn group_tables(all_tables: &[Table], strategy: GroupingStrategy) -> Vec<Group<'_>> {
    let (related, unrelated) = partition_tables(all_tables);

    let mut groups = match strategy {
        GroupingStrategy::Greedy => group_greedy(&related),
        GroupingStrategy::Connected => group_connected(&related),
    };

    if !unrelated.is_empty() {
        groups.push(Group {
            main_table: None,
            related_tables: unrelated,
            is_related: false,
        });
    }

    groups
}

/// Each unassigned table opens a group and absorbs the unassigned tables that reference it
/// directly. Chains are not followed.
fn group_greedy<'a>(related: &[&'a Table]) -> Vec<Group<'a>> {
    let mut processed: HashSet<&str> = HashSet::new();
    let mut groups = Vec::new();

    for &table in related {
        if processed.contains(table.table_name.as_str()) {
            continue;
        }
        processed.insert(table.table_name.as_str());

        let mut members = Vec::new();
        for &other in related {
            if other.table_name == table.table_name
                || processed.contains(other.table_name.as_str())
            {
                continue;
            }
            if other.references(&table.table_name) {
                processed.insert(other.table_name.as_str());
                members.push(other);
            }
        }

        groups.push(Group {
            main_table: Some(table),
            related_tables: members,
            is_related: true,
        });
    }

    groups
}

/// Connected components over undirected foreign-key edges, seeded in input order.
fn group_connected<'a>(related: &[&'a Table]) -> Vec<Group<'a>> {
    let n = related.len();
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        for j in (i + 1)..n {
            if related[i].references(&related[j].table_name)
                || related[j].references(&related[i].table_name)
            {
                adjacency[i].push(j);
                adjacency[j].push(i);
            }
        }
    }

    let mut assigned = vec![false; n];
    let mut groups = Vec::new();

    for seed in 0..n {
        if assigned[seed] {
            continue;
        }
        assigned[seed] = true;

        let mut component = vec![seed];
        let mut queue = VecDeque::from([seed]);
        while let Some(current) = queue.pop_front() {
            for &next in &adjacency[current] {
                if !assigned[next] {
                    assigned[next] = true;
                    component.push(next);
                    queue.push_back(next);
                }
            }
        }

        component.sort_unstable();
        let members = component[1..].iter().map(|&i| related[i]).collect();
        groups.push(Group {
            main_table: Some(related[seed]),
            related_tables: members,
            is_related: true,
        });
    }

    groups
}

/// Names of the tables to highlight for `table_name`: itself, the tables it references and
/// the tables referencing it.
pub fn related_tables(table_name: &str, all_tables: &[Table]) -> Vec<String> {
    let mut names = vec![table_name.to_string()];
    let mut push = |name: &str| {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    };

    if let Some(table) = all_tables.iter().find(|t| t.table_name == table_name) {
        for fk in &table.foreign_keys {
            push(&fk.references_table);
        }
    }

    for table in all_tables {
        if table.references(table_name) {
            push(&table.table_name);
        }
    }

    names
}
