mod domain;
mod events;
mod images;
mod shipping;
mod store;

mod admin;
mod checkout;

mod app_system;

#[cfg(test)]
mod mock_framework;

use std::sync::Arc;

use tracing::{info, Instrument};

use crate::admin::{CategoryDraft, ProductDraft};
use crate::app_system::{setup_tracing, ShopSystem};
use crate::domain::{
    CartSession, DeliveryDetails, NewUser, OrderFilter, OrderStatus, UserPatch, ADMIN_ROLE,
    CUSTOMER_ROLE, SUPER_ADMIN_EMAIL,
};
use crate::images::DiskImageStore;

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    info!("Starting furniture storefront");

    let images = Arc::new(DiskImageStore::new("public"));
    let system = ShopSystem::new(images);

    // Bootstrap accounts go straight through the store; the user-admin
    // workflow gates on an existing super admin.
    let admin_id = system
        .store
        .create_user(NewUser {
            name: "Store Admin".to_string(),
            email: SUPER_ADMIN_EMAIL.to_string(),
            role_id: ADMIN_ROLE,
            is_activate: true,
        })
        .await
        .map_err(|e| e.to_string())?;
    let admin = system
        .store
        .get_user(admin_id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("admin account missing after creation")?;

    system
        .store
        .create_user(NewUser {
            name: "Nguyen Van An".to_string(),
            email: "customer@gmail.com".to_string(),
            role_id: CUSTOMER_ROLE,
            is_activate: true,
        })
        .await
        .map_err(|e| e.to_string())?;
    let customer = system
        .store
        .find_user_by_email("customer@gmail.com".to_string())
        .await
        .map_err(|e| e.to_string())?
        .ok_or("customer account missing after creation")?;

    let roles = system.store.list_roles().await.map_err(|e| e.to_string())?;
    info!(
        admin_id = %admin.id,
        customer_id = %customer.id,
        roles = roles.len(),
        "Accounts seeded"
    );

    // The back office builds a small catalog.
    let span = tracing::info_span!("catalog_setup");
    let (sofa, table_id) = async {
        let sofa_category = system
            .categories
            .create(CategoryDraft {
                name: "Sofa".to_string(),
                image: None,
            })
            .await
            .map_err(|e| e.to_string())?;
        let table_category = system
            .categories
            .create(CategoryDraft {
                name: "Table".to_string(),
                image: None,
            })
            .await
            .map_err(|e| e.to_string())?;
        system
            .categories
            .update(
                table_category,
                CategoryDraft {
                    name: "Tables & Desks".to_string(),
                    image: None,
                },
            )
            .await
            .map_err(|e| e.to_string())?;

        let sofa_id = system
            .products
            .create(ProductDraft {
                name: "Leather Sofa".to_string(),
                price: 2_000_000,
                stock: Some(10),
                category_id: sofa_category,
                image: None,
            })
            .await
            .map_err(|e| e.to_string())?;
        // Price correction before launch.
        let sofa = system
            .products
            .update(
                sofa_id,
                ProductDraft {
                    name: "Leather Sofa".to_string(),
                    price: 2_500_000,
                    stock: Some(10),
                    category_id: sofa_category,
                    image: None,
                },
            )
            .await
            .map_err(|e| e.to_string())?;
        let table_id = system
            .products
            .create(ProductDraft {
                name: "Oak Table".to_string(),
                price: 4_000_000,
                stock: None,
                category_id: table_category,
                image: None,
            })
            .await
            .map_err(|e| e.to_string())?;

        let listed = system.products.list().await.map_err(|e| e.to_string())?;
        info!(products = listed.len(), "Catalog seeded");
        Ok::<_, String>((sofa, table_id))
    }
    .instrument(span)
    .await?;

    // A customer fills a cart, captures delivery details, and checks out.
    let span = tracing::info_span!("order_processing");
    let order_id = async {
        let table = system
            .store
            .get_product(table_id)
            .await
            .map_err(|e| e.to_string())?
            .ok_or("table missing after creation")?;

        let mut cart = CartSession::new();
        cart.add(&sofa, 4);
        cart.add(&table, 1);
        // Second thoughts: drop the table, settle on three sofas.
        cart.remove(table.product_id);
        cart.set_quantity(sofa.product_id, 3);

        let preview = shipping::shipping_info(cart.subtotal());
        match shipping::amount_for_free_shipping(preview.subtotal) {
            Some(missing) => info!(
                items = cart.total_quantity(),
                tier = preview.tier.as_str(),
                missing,
                "Cart preview: spend more for free shipping"
            ),
            None => info!(
                items = cart.total_quantity(),
                tier = preview.tier.as_str(),
                "Cart preview"
            ),
        }

        system
            .checkout
            .capture_delivery(
                &mut cart,
                DeliveryDetails {
                    user_name: customer.name.clone(),
                    email: customer.email.clone(),
                    phone_number: "0901234567".to_string(),
                    country: "Vietnam".to_string(),
                    city: "Ha Noi".to_string(),
                    district: "Dong Da".to_string(),
                    ward: Some("O Cho Dua".to_string()),
                },
            )
            .map_err(|e| e.to_string())?;

        info!("Placing order through checkout");
        system
            .checkout
            .place_order(&customer, &mut cart)
            .await
            .map_err(|e| e.to_string())
    }
    .instrument(span)
    .await?;

    let order = system
        .store
        .get_order(order_id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("order missing after checkout")?;
    let delivery = system
        .store
        .order_delivery(order_id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("delivery info missing after checkout")?;
    info!(
        order_id = %order.order_id,
        total_cost = order.total_cost,
        shipping_fee = order.shipping_fee,
        recipient = %delivery.details.user_name,
        city = %delivery.details.city,
        "Order placed successfully"
    );

    // A second order gets cancelled by the customer before approval.
    let cancelled_id = {
        let mut cart = CartSession::new();
        cart.add(&sofa, 1);
        system
            .checkout
            .capture_delivery(&mut cart, delivery.details.clone())
            .map_err(|e| e.to_string())?;
        let id = system
            .checkout
            .place_order(&customer, &mut cart)
            .await
            .map_err(|e| e.to_string())?;
        system
            .checkout
            .cancel_order(&customer, id)
            .await
            .map_err(|e| e.to_string())?;
        id
    };
    info!(order_id = %cancelled_id, "Second order cancelled by the customer");

    // The back office walks the first order to delivered. Statuses arrive
    // as wire values, exactly as the HTTP surface would hand them over.
    let span = tracing::info_span!("back_office");
    async {
        for value in ["approved", "delivering", "delivered"] {
            let status = OrderStatus::parse(value).ok_or("unknown status value")?;
            system
                .order_status
                .update_status(&admin, order_id, status)
                .await
                .map_err(|e| e.to_string())?;
            info!("{}", status.confirmation_message());
        }

        let (order, items) = system
            .order_status
            .order_details(order_id)
            .await
            .map_err(|e| e.to_string())?;
        info!(
            order_id = %order.order_id,
            lines = items.len(),
            first_line_quantity = items.first().map(|item| item.quantity).unwrap_or(0),
            unit_price = items.first().map(|item| item.price).unwrap_or(0),
            "Order details"
        );

        for entry in system
            .order_status
            .history(order_id)
            .await
            .map_err(|e| e.to_string())?
        {
            info!(action = %entry.action_type, actor = %entry.actor_id, at = %entry.date, "Audit");
        }

        let delivered = system
            .order_status
            .list_orders(OrderFilter {
                status: Some(OrderStatus::Delivered),
                ..OrderFilter::default()
            })
            .await
            .map_err(|e| e.to_string())?;
        info!(delivered = delivered.len(), "Delivered orders");
        Ok::<_, String>(())
    }
    .instrument(span)
    .await?;

    // The customer reviews the sofa; the back office inspects and keeps it.
    let feedback_id = system
        .feedbacks
        .submit(&customer, sofa.product_id, 5, "Great sofa".to_string())
        .await
        .map_err(|e| e.to_string())?;
    let detail = system
        .feedbacks
        .detail(feedback_id)
        .await
        .map_err(|e| e.to_string())?;
    info!(
        rating = detail.feedback.rating,
        comment = %detail.feedback.comment,
        by = %detail.user.map(|u| u.name).unwrap_or_default(),
        "Feedback received"
    );

    // The super admin provisions a second back-office account.
    let staff_id = system
        .users
        .create_user(
            &admin,
            NewUser {
                name: "Tran Thi Binh".to_string(),
                email: "staff@gmail.com".to_string(),
                role_id: ADMIN_ROLE,
                is_activate: false,
            },
        )
        .await
        .map_err(|e| e.to_string())?;
    system
        .users
        .update_user(
            &admin,
            staff_id,
            UserPatch {
                name: Some("Tran Thi Binh (warehouse)".to_string()),
                ..UserPatch::default()
            },
        )
        .await
        .map_err(|e| e.to_string())?;
    let active = system
        .users
        .toggle_activation(&admin, staff_id)
        .await
        .map_err(|e| e.to_string())?;
    let user_count = system
        .users
        .list_users()
        .await
        .map_err(|e| e.to_string())?
        .len();
    info!(staff_id = %staff_id, active, users = user_count, "Staff account ready");

    let stats = system
        .store
        .dashboard_stats()
        .await
        .map_err(|e| e.to_string())?;
    info!(
        users = stats.total_users,
        categories = stats.total_categories,
        products = stats.total_products,
        orders = stats.total_orders,
        pending = stats.pending_orders,
        feedbacks = stats.total_feedbacks,
        "Dashboard"
    );

    // Shutdown system gracefully
    system.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}
