use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        bills::{BillList, SettlePaymentRequest},
        orders::{OrderList, PlaceOrderRequest, PlacedOrder, UpdateOrderStatusRequest},
        tables::{AccessQuery, AccessReport, CreateTableRequest, ReconcileReport, TableList},
        wallet::{
            RechargeRequest, SufficiencyReport, TransactionList, UpdateChargesRequest,
            WalletDetails,
        },
    },
    models::{
        ActiveTableEntry, Bill, DiningTable, LineItem, TableOrder, TableOverview, Wallet,
        WalletTransaction,
    },
    response::{ApiResponse, Meta},
    routes::{bills, health, orders, params, tables, wallet},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        tables::create_table,
        tables::list_tables,
        tables::get_table,
        tables::delete_table,
        tables::verify_access,
        tables::settle_payment,
        tables::list_active_entries,
        tables::reconcile,
        orders::place_order,
        orders::list_orders,
        orders::list_by_session,
        orders::update_status,
        bills::list_bills,
        bills::get_bill,
        bills::complete_bill,
        wallet::get_wallet,
        wallet::recharge,
        wallet::update_charges,
        wallet::list_transactions,
        wallet::check_sufficiency
    ),
    components(
        schemas(
            DiningTable,
            TableOverview,
            TableOrder,
            Bill,
            LineItem,
            ActiveTableEntry,
            Wallet,
            WalletTransaction,
            CreateTableRequest,
            TableList,
            AccessQuery,
            AccessReport,
            ReconcileReport,
            PlaceOrderRequest,
            PlacedOrder,
            UpdateOrderStatusRequest,
            OrderList,
            SettlePaymentRequest,
            BillList,
            RechargeRequest,
            UpdateChargesRequest,
            SufficiencyReport,
            WalletDetails,
            TransactionList,
            params::Pagination,
            params::OrderListQuery,
            params::BillListQuery,
            Meta,
            ApiResponse<DiningTable>,
            ApiResponse<TableList>,
            ApiResponse<Bill>,
            ApiResponse<BillList>,
            ApiResponse<PlacedOrder>,
            ApiResponse<OrderList>,
            ApiResponse<WalletDetails>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Tables", description = "Table registry and guest access"),
        (name = "Orders", description = "Guest orders and kitchen workflow"),
        (name = "Bills", description = "Bill aggregation and settlement"),
        (name = "Wallet", description = "Hotel wallet and metered charges"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
