//! Transaction control statements.

use sqlgen_core::{Error, Result};

use crate::generator::QueryGenerator;
use crate::options::{IsolationLevel, StartTransactionOptions};

impl QueryGenerator {
    /// `START TRANSACTION` (or `BEGIN`) for this dialect.
    pub fn start_transaction_query(&self, options: &StartTransactionOptions) -> Result<String> {
        self.ops().start_transaction(self, options)
    }

    pub fn commit_transaction_query(&self) -> Result<String> {
        self.ops().commit_transaction(self)
    }

    pub fn rollback_transaction_query(&self) -> Result<String> {
        self.ops().rollback_transaction(self)
    }

    pub fn create_savepoint_query(&self, name: &str) -> Result<String> {
        self.ops().create_savepoint(self, name)
    }

    pub fn rollback_savepoint_query(&self, name: &str) -> Result<String> {
        self.ops().rollback_savepoint(self, name)
    }

    pub fn set_isolation_level_query(&self, level: IsolationLevel) -> Result<String> {
        self.ops().set_isolation_level(self, level)
    }

    // ==================== Shared syntax ====================

    pub(crate) fn check_start_transaction_options(
        &self,
        options: &StartTransactionOptions,
    ) -> Result<()> {
        let supports = self.supports();
        let mut requested = Vec::new();
        if options.read_only {
            requested.push(("readOnly", supports.enabled("startTransaction.readOnly")));
        }
        if options.transaction_type.is_some() {
            requested.push((
                "transactionType",
                supports.enabled("startTransaction.transactionType"),
            ));
        }
        self.reject_invalid_options("startTransactionQuery", &requested)
    }

    pub(crate) fn default_start_transaction(
        &self,
        options: &StartTransactionOptions,
    ) -> Result<String> {
        self.reject_connection_transactions("startTransactionQuery")?;
        self.check_start_transaction_options(options)?;
        let mut sql = if self.supports().enabled("startTransaction.useBegin") {
            String::from("BEGIN")
        } else {
            String::from("START TRANSACTION")
        };
        if options.read_only {
            sql.push_str(" READ ONLY");
        }
        Ok(sql)
    }

    /// Dialects whose driver manages transactions on the connection have no
    /// SQL for them.
    pub(crate) fn reject_connection_transactions(&self, operation: &str) -> Result<()> {
        if !self.supports().enabled("connectionTransactionMethods") {
            return Ok(());
        }
        tracing::debug!(dialect = self.dialect_name(), operation, "capability rejected");
        Err(Error::unsupported(
            self.dialect_name(),
            "connectionTransactionMethods",
            format!(
                "{operation} is not supported by the {} dialect.",
                self.dialect_name()
            ),
        ))
    }

    pub(crate) fn require_savepoints(&self) -> Result<()> {
        self.require("savepoints", || {
            format!("Savepoints are not supported by {}.", self.dialect_name())
        })
    }

    pub(crate) fn default_isolation_level(&self, level: IsolationLevel) -> Result<String> {
        self.require("isolationLevels", || {
            format!(
                "Isolation levels are not supported by {}.",
                self.dialect_name()
            )
        })?;
        Ok(format!("SET TRANSACTION ISOLATION LEVEL {}", level.as_sql()))
    }
}
