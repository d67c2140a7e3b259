//! SELECT generation.
//!
//! Includes become joins aliased by their association path
//! (`projects->tasks`), and their columns are aliased by the dotted path
//! (`projects.tasks.title`) so the row materializer can rebuild the tree.
//! When a limit is combined with a to-many include, the main table is
//! paginated in a subquery first so the limit counts parent rows.

use sqlgen_core::{AssociationKind, Error, ModelDefinition, Result, TableRef, ValidationErrorKind};

use crate::alias::AliasMap;
use crate::bind::{BindCollector, Statement};
use crate::expr::RenderContext;
use crate::generator::QueryGenerator;
use crate::options::{Include, Lock, LockStrength, OrderItem, SelectAttribute, SelectOptions};

/// Columns and joins produced by walking the include tree.
#[derive(Debug, Default)]
struct JoinTree {
    columns: Vec<String>,
    joins: Vec<String>,
}

/// The parent side of a join.
struct Parent<'a> {
    /// Association path from the root (`None` for the main model)
    path: Option<&'a str>,
    /// Quoted SQL alias
    alias: &'a str,
    model: Option<&'a ModelDefinition>,
}

fn has_right_join(includes: &[Include]) -> bool {
    includes
        .iter()
        .any(|i| !i.separate && (i.right || has_right_join(&i.include)))
}

impl QueryGenerator {
    /// Build a `SELECT` for `table`.
    ///
    /// `model` supplies the attribute map, the main alias (the model name)
    /// and the primary key used to order paginated results.
    #[tracing::instrument(
        level = "trace",
        skip_all,
        fields(dialect = self.dialect_name(), table = %table.table_name)
    )]
    pub fn select_query(
        &self,
        table: &TableRef,
        options: &SelectOptions,
        model: Option<&ModelDefinition>,
    ) -> Result<Statement> {
        self.check_select_options(options)?;
        let table_hints = self.table_hints_fragment(options)?;

        let joined: Vec<&Include> = options.include.iter().filter(|i| !i.separate).collect();
        let main_alias = model
            .map(|m| m.name.clone())
            .or_else(|| table.alias.clone())
            .or_else(|| (!joined.is_empty()).then(|| table.table_name.clone()));
        let prefix = main_alias.as_deref().map(|a| self.quote_alias(a));
        let from = match &prefix {
            Some(alias) => format!("{} AS {alias}", self.quote_table_name(table)),
            None => self.quote_table_name(table),
        };

        let sub_query = !joined.is_empty()
            && options.sub_query.unwrap_or_else(|| {
                options.limit.is_some() && joined.iter().any(|i| i.association.is_multi())
            });
        let paginated = options.limit.is_some() || options.offset.is_some_and(|o| o > 0);

        let mut head = String::from("SELECT ");
        if let Some(millis) = options.max_execution_time {
            head.push_str(&format!("/*+ MAX_EXECUTION_TIME({millis}) */ "));
        }
        if options.distinct {
            head.push_str("DISTINCT ");
        }

        let mut binds = BindCollector::new();
        let mut aliases = AliasMap::new();
        let sql = {
            let mut ctx = RenderContext {
                model,
                prefix: prefix.clone(),
                binds: self.options().bind_param.then_some(&mut binds),
                aliases: Some(&mut aliases),
            };
            let main_columns = self.main_columns(options, model, prefix.as_deref(), &mut ctx)?;
            let limit = self
                .ops()
                .limit_fragment(self, options.limit, options.offset)?;

            if sub_query {
                let alias = prefix.as_deref().unwrap_or_default();
                let distinct = if options.distinct { "DISTINCT " } else { "" };
                let mut inner = format!(
                    "SELECT {distinct}{} FROM {from}{table_hints}",
                    main_columns.join(", ")
                );
                inner.push_str(&self.filter_fragments(options, &mut ctx)?);
                inner.push_str(&self.order_fragment(
                    &options.order,
                    model,
                    prefix.as_deref(),
                    paginated,
                    &mut ctx,
                )?);
                inner.push_str(&limit);

                let mut tree = JoinTree::default();
                let parent = Parent {
                    path: None,
                    alias,
                    model,
                };
                self.walk_includes(&options.include, &parent, &mut tree, &mut ctx)?;

                let mut columns = vec![format!("{alias}.*")];
                columns.extend(tree.columns);
                let head = head.replacen("DISTINCT ", "", 1);
                let mut sql = format!("{head}{} FROM ({inner}) AS {alias}", columns.join(", "));
                for join in &tree.joins {
                    sql.push(' ');
                    sql.push_str(join);
                }
                sql.push_str(&self.order_fragment(&options.order, model, prefix.as_deref(), false, &mut ctx)?);
                if let Some(lock) = &options.lock {
                    sql.push(' ');
                    sql.push_str(&self.lock_fragment(lock));
                }
                sql
            } else {
                let mut tree = JoinTree::default();
                if let Some(alias) = prefix.as_deref() {
                    let parent = Parent {
                        path: None,
                        alias,
                        model,
                    };
                    self.walk_includes(&options.include, &parent, &mut tree, &mut ctx)?;
                }
                let mut columns = main_columns;
                columns.extend(tree.columns);
                let mut sql = format!("{head}{} FROM {from}{table_hints}", columns.join(", "));
                for join in &tree.joins {
                    sql.push(' ');
                    sql.push_str(join);
                }
                sql.push_str(&self.filter_fragments(options, &mut ctx)?);
                sql.push_str(&self.order_fragment(&options.order, model, prefix.as_deref(), paginated, &mut ctx)?);
                sql.push_str(&limit);
                if let Some(lock) = &options.lock {
                    sql.push(' ');
                    sql.push_str(&self.lock_fragment(lock));
                }
                sql
            }
        };

        let mut statement = if self.options().bind_param {
            binds.finish(format!("{sql};"))
        } else {
            Statement::new(format!("{sql};"))
        };
        statement.aliases = aliases;
        self.log_statement("selectQuery", &table.table_name, &statement);
        Ok(statement)
    }

    /// Reject every select option the dialect cannot honor in one error.
    fn check_select_options(&self, options: &SelectOptions) -> Result<()> {
        let supports = self.supports();
        let mut requested = Vec::new();
        if let Some(lock) = &options.lock {
            requested.push(("lock", supports.enabled("lock")));
            match lock.strength {
                LockStrength::Share => requested.push(("forShare", supports.enabled("forShare"))),
                LockStrength::KeyShare | LockStrength::NoKeyUpdate => {
                    requested.push(("lockKey", supports.enabled("lockKey")));
                }
                LockStrength::Update => {}
            }
            if lock.of.is_some() {
                requested.push(("lockOf", supports.enabled("lockOf")));
            }
            if lock.skip_locked {
                requested.push(("skipLocked", supports.enabled("skipLocked")));
            }
        }
        if options.order.iter().any(|o| o.nulls.is_some()) {
            requested.push(("ORDER NULLS", supports.enabled("ORDER NULLS")));
        }
        if has_right_join(&options.include) {
            requested.push(("RIGHT JOIN", supports.enabled("RIGHT JOIN")));
        }
        if options.max_execution_time.is_some() {
            requested.push((
                "maxExecutionTimeHint",
                supports.enabled("maxExecutionTimeHint.select"),
            ));
        }
        self.reject_invalid_options("selectQuery", &requested)
    }

    /// Index and table hints placed after the table name.
    fn table_hints_fragment(&self, options: &SelectOptions) -> Result<String> {
        let supports = self.supports();
        let mut requested = Vec::new();
        if !options.index_hints.is_empty() {
            requested.push(("indexHints", supports.enabled("indexHints")));
        }
        if !options.table_hints.is_empty() {
            requested.push(("tableHints", supports.enabled("tableHints")));
        }
        self.reject_invalid_options("quoteTable", &requested)?;

        let mut out = String::new();
        for hint in &options.index_hints {
            let indexes: Vec<String> = hint
                .indexes
                .iter()
                .map(|i| self.quote_identifier(i))
                .collect();
            out.push_str(&format!(" {} INDEX ({})", hint.kind.as_sql(), indexes.join(",")));
        }
        if !options.table_hints.is_empty() {
            let hints: Vec<&str> = options.table_hints.iter().map(|h| h.as_sql()).collect();
            out.push_str(&format!(" WITH ({})", hints.join(", ")));
        }
        Ok(out)
    }

    fn main_columns(
        &self,
        options: &SelectOptions,
        model: Option<&ModelDefinition>,
        prefix: Option<&str>,
        ctx: &mut RenderContext<'_>,
    ) -> Result<Vec<String>> {
        let qualify = |column: &str| match prefix {
            Some(prefix) => format!("{prefix}.{}", self.quote_identifier(column)),
            None => self.quote_identifier(column),
        };
        match (&options.attributes, model) {
            (Some(attributes), _) => attributes
                .iter()
                .map(|a| self.select_attribute(a, ctx))
                .collect(),
            (None, Some(model)) if !model.attributes.is_empty() => Ok(model
                .attributes
                .iter()
                .map(|a| {
                    let column = qualify(&a.column_name);
                    if a.column_name == a.name {
                        column
                    } else {
                        format!("{column} AS {}", self.quote_alias(&a.name))
                    }
                })
                .collect()),
            (None, _) => Ok(vec![qualify("*")]),
        }
    }

    fn select_attribute(
        &self,
        attribute: &SelectAttribute,
        ctx: &mut RenderContext<'_>,
    ) -> Result<String> {
        let sql = self.format_expr(&attribute.expr, ctx)?;
        let Some(alias) = &attribute.alias else {
            return Ok(sql);
        };
        let alias = self.column_alias(alias, ctx)?;
        Ok(format!("{sql} AS {}", self.quote_alias(&alias)))
    }

    /// Minified token for a column alias, or the alias itself after the
    /// identifier length check.
    fn column_alias(&self, full: &str, ctx: &mut RenderContext<'_>) -> Result<String> {
        match ctx.aliases.as_deref_mut() {
            Some(aliases) if self.options().minify_aliases => Ok(aliases.column(full)),
            _ => {
                self.check_identifier_length(full)?;
                Ok(full.to_string())
            }
        }
    }

    fn table_alias(&self, full: &str, ctx: &mut RenderContext<'_>) -> Result<String> {
        match ctx.aliases.as_deref_mut() {
            Some(aliases) if self.options().minify_aliases => Ok(aliases.table(full)),
            _ => {
                self.check_identifier_length(full)?;
                Ok(full.to_string())
            }
        }
    }

    /// Depth-first walk over non-separate includes.
    fn walk_includes(
        &self,
        includes: &[Include],
        parent: &Parent<'_>,
        tree: &mut JoinTree,
        ctx: &mut RenderContext<'_>,
    ) -> Result<()> {
        for include in includes.iter().filter(|i| !i.separate) {
            let association = &include.association;
            let target = association.target.as_ref();
            let full = match parent.path {
                Some(path) => format!("{path}->{}", association.as_name),
                None => association.as_name.clone(),
            };
            let alias = self.quote_alias(&self.table_alias(&full, ctx)?);

            let dotted = full.replace("->", ".");
            let names: Vec<&str> = match &include.attributes {
                Some(names) => names.iter().map(String::as_str).collect(),
                None => target.attributes.iter().map(|a| a.name.as_str()).collect(),
            };
            for name in names {
                let column = target.column_for(name);
                let column_alias = self.column_alias(&format!("{dotted}.{name}"), ctx)?;
                tree.columns.push(format!(
                    "{alias}.{} AS {}",
                    self.quote_identifier(column),
                    self.quote_alias(&column_alias)
                ));
            }

            let parent_column = |name: &str| {
                let column = parent.model.map_or(name, |m| m.column_for(name));
                format!("{}.{}", parent.alias, self.quote_identifier(column))
            };
            let target_column =
                |name: &str| format!("{alias}.{}", self.quote_identifier(target.column_for(name)));

            let join_kind = if include.required {
                "INNER JOIN"
            } else if include.right {
                "RIGHT OUTER JOIN"
            } else {
                "LEFT OUTER JOIN"
            };
            let target_table = self.quote_table_name(&target.table);

            let mut condition = match association.kind {
                AssociationKind::BelongsTo => format!(
                    "{} = {}",
                    parent_column(&association.foreign_key),
                    target_column(&association.target_key)
                ),
                AssociationKind::HasOne | AssociationKind::HasMany => format!(
                    "{} = {}",
                    parent_column(&association.source_key),
                    target_column(&association.foreign_key)
                ),
                AssociationKind::BelongsToMany => String::new(),
            };
            if let Some(where_) = &include.where_ {
                let mut scoped = ctx.scoped(Some(target), Some(alias.clone()));
                let filter = self.where_group(where_, &mut scoped)?;
                if !filter.is_empty() {
                    if !condition.is_empty() {
                        condition.push_str(" AND ");
                    }
                    condition.push_str(&filter);
                }
            }

            let join = if association.kind == AssociationKind::BelongsToMany {
                let through = association.through.as_ref().ok_or_else(|| {
                    Error::validation(
                        ValidationErrorKind::Invalid,
                        format!("{} is a many-to-many association without a join table", association.as_name),
                    )
                })?;
                let through_alias =
                    self.quote_alias(&self.table_alias(&format!("{full}->{}", through.model.name), ctx)?);
                let through_column = |name: &str| {
                    format!(
                        "{through_alias}.{}",
                        self.quote_identifier(through.model.column_for(name))
                    )
                };
                let mut inner_on = format!(
                    "{} = {}",
                    target_column(&association.target_key),
                    through_column(&through.other_key)
                );
                if !condition.is_empty() {
                    inner_on.push_str(" AND ");
                    inner_on.push_str(&condition);
                }
                format!(
                    "{join_kind} ( {} AS {through_alias} INNER JOIN {target_table} AS {alias} ON {inner_on}) ON {} = {}",
                    self.quote_table_name(&through.model.table),
                    parent_column(&association.source_key),
                    through_column(&through.foreign_key)
                )
            } else {
                format!("{join_kind} {target_table} AS {alias} ON {condition}")
            };
            tree.joins.push(join);

            let child = Parent {
                path: Some(&full),
                alias: &alias,
                model: Some(target),
            };
            self.walk_includes(&include.include, &child, tree, ctx)?;
        }
        Ok(())
    }

    /// ` WHERE ... GROUP BY ... HAVING ...`
    fn filter_fragments(&self, options: &SelectOptions, ctx: &mut RenderContext<'_>) -> Result<String> {
        let mut out = String::new();
        if let Some(where_) = &options.where_ {
            let sql = self.where_query(where_, ctx)?;
            if !sql.is_empty() {
                out.push(' ');
                out.push_str(&sql);
            }
        }
        if !options.group.is_empty() {
            let group = options
                .group
                .iter()
                .map(|g| self.format_expr(g, ctx))
                .collect::<Result<Vec<_>>>()?;
            out.push_str(" GROUP BY ");
            out.push_str(&group.join(", "));
        }
        if let Some(having) = &options.having {
            let sql = self.where_items(having, ctx)?;
            if !sql.is_empty() {
                out.push_str(" HAVING ");
                out.push_str(&sql);
            }
        }
        Ok(out)
    }

    /// ` ORDER BY ...`; paginated queries without an order fall back to the
    /// primary key, then to the dialect's placeholder order.
    fn order_fragment(
        &self,
        order: &[OrderItem],
        model: Option<&ModelDefinition>,
        prefix: Option<&str>,
        paginated: bool,
        ctx: &mut RenderContext<'_>,
    ) -> Result<String> {
        let mut terms = Vec::with_capacity(order.len());
        for item in order {
            let mut term = self.format_expr(&item.expr, ctx)?;
            if let Some(direction) = item.direction {
                term.push(' ');
                term.push_str(direction.as_sql());
            }
            if let Some(nulls) = item.nulls {
                term.push(' ');
                term.push_str(nulls.as_sql());
            }
            terms.push(term);
        }
        if terms.is_empty() && paginated {
            let primary_keys: Vec<String> = model
                .map(|m| {
                    m.primary_key_attributes()
                        .map(|a| {
                            let column = self.quote_identifier(&a.column_name);
                            match prefix {
                                Some(prefix) => format!("{prefix}.{column}"),
                                None => column,
                            }
                        })
                        .collect()
                })
                .unwrap_or_default();
            if !primary_keys.is_empty() {
                terms = primary_keys;
            } else if let Some(fallback) = self.ops().fallback_order() {
                terms.push(fallback.to_string());
            }
        }
        if terms.is_empty() {
            return Ok(String::new());
        }
        Ok(format!(" ORDER BY {}", terms.join(", ")))
    }

    fn lock_fragment(&self, lock: &Lock) -> String {
        let mut out = match lock.strength {
            LockStrength::Update => "FOR UPDATE".to_string(),
            LockStrength::Share => self
                .supports()
                .text("forShare")
                .unwrap_or("FOR SHARE")
                .to_string(),
            LockStrength::KeyShare => "FOR KEY SHARE".to_string(),
            LockStrength::NoKeyUpdate => "FOR NO KEY UPDATE".to_string(),
        };
        if let Some(of) = &lock.of {
            out.push_str(" OF ");
            out.push_str(&self.quote_alias(of));
        }
        if lock.skip_locked {
            out.push_str(" SKIP LOCKED");
        }
        out
    }
}
