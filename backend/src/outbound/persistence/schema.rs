//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are
//! used by Diesel for compile-time query validation and type-safe SQL
//! generation. When migrations change the schema, regenerate with
//! `diesel print-schema` or update by hand.

diesel::table! {
    /// Aggregator connections table.
    ///
    /// One row per authorization flow against an institution. The
    /// `requisition_id` column is the aggregator's session identifier and
    /// carries a unique index.
    connections (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning user.
        user_id -> Uuid,
        /// Aggregator institution identifier.
        institution_id -> Varchar,
        /// Institution display name captured at link time.
        institution_name -> Varchar,
        /// ISO 3166-1 alpha-2 country code.
        country_code -> Varchar,
        /// Aggregator requisition (authorization session) identifier.
        requisition_id -> Varchar,
        /// Lifecycle status, stored as its snake_case string form.
        status -> Varchar,
        /// When the end-user agreement was accepted, once linked.
        agreement_accepted_at -> Nullable<Timestamptz>,
        /// Last completed sync pass involving this connection.
        last_sync_at -> Nullable<Timestamptz>,
        /// Failure message from the last sync pass, cleared on success.
        last_sync_error -> Nullable<Text>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Bank accounts table, both aggregator-materialized and manual.
    bank_accounts (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning user.
        user_id -> Uuid,
        /// Connection that materialized this account; null for manual ones.
        connection_id -> Nullable<Uuid>,
        /// Name shown in the UI.
        display_name -> Varchar,
        /// Institution display name.
        bank_name -> Varchar,
        /// Account category, stored as its snake_case string form.
        account_type -> Varchar,
        /// ISO 4217 currency code.
        currency -> Varchar,
        /// Last four characters of the IBAN, when known.
        last_four -> Nullable<Varchar>,
        /// `manual` or `aggregator`.
        connection_kind -> Varchar,
        /// Aggregator account identifier; unique when present.
        external_id -> Nullable<Varchar>,
        /// Cleared on disconnect instead of deleting the row.
        is_active -> Bool,
        /// User-entered balance for manual accounts.
        manual_balance -> Nullable<Float8>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Daily balance snapshots, unique per `(account_id, balance_date)`.
    account_balances (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Account the snapshot belongs to.
        account_id -> Uuid,
        /// Booked balance.
        amount -> Float8,
        /// Available balance, when the aggregator reports one.
        available_amount -> Nullable<Float8>,
        /// ISO 4217 currency code.
        currency -> Varchar,
        /// Day the snapshot describes.
        balance_date -> Date,
        /// `aggregator` or `manual`.
        source -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Ledger entries; aggregator rows are unique by `external_id`.
    account_transactions (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Account the entry belongs to.
        account_id -> Uuid,
        /// Aggregator transaction identifier; unique when present.
        external_id -> Nullable<Varchar>,
        /// Signed amount; negative is money out.
        amount -> Float8,
        /// ISO 4217 currency code.
        currency -> Varchar,
        /// Settlement date.
        booked_on -> Date,
        /// Value date, when reported.
        value_date -> Nullable<Date>,
        /// Remittance information.
        description -> Nullable<Text>,
        /// Creditor or debtor name, depending on direction.
        counterparty -> Nullable<Varchar>,
        /// `debit` or `credit`.
        direction -> Varchar,
        /// End-to-end reference, when reported.
        reference -> Nullable<Varchar>,
        /// `aggregator` or `manual`.
        source -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(bank_accounts -> connections (connection_id));
diesel::joinable!(account_balances -> bank_accounts (account_id));
diesel::joinable!(account_transactions -> bank_accounts (account_id));

diesel::allow_tables_to_appear_in_same_query!(
    connections,
    bank_accounts,
    account_balances,
    account_transactions,
);
