// Esquema Diesel del portal. Ids como Text (UUID), instantes como BigInt
// (epoch millis) y fechas de calendario como Text (YYYY-MM-DD).
diesel::table! {
    users (id) {
        id -> Text,
        email -> Text,
        name -> Text,
        role -> Text,
        password_hash -> Text,
        created_at -> BigInt,
    }
}
diesel::table! {
    faculty_profiles (user_id) {
        user_id -> Text,
        department -> Nullable<Text>,
    }
}
diesel::table! {
    student_profiles (user_id) {
        user_id -> Text,
        student_number -> Nullable<Text>,
        program -> Nullable<Text>,
    }
}
diesel::table! {
    inventory_items (id) {
        id -> Text,
        kind -> Text,
        name -> Text,
        description -> Text,
        specification -> Nullable<Text>,
        category -> Text,
        location -> Text,
        total_quantity -> BigInt,
        tag_id -> Nullable<Text>,
        domain_id -> Nullable<Text>,
        invoice_number -> Nullable<Text>,
        purchase_value -> Nullable<Double>,
        purchase_currency -> Text,
        purchase_date -> Nullable<Text>,
        created_by -> Text,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}
diesel::table! {
    checkout_requests (id) {
        id -> Text,
        kind -> Text,
        item_id -> Text,
        student_id -> Text,
        status -> Text,
        purpose -> Nullable<Text>,
        notes -> Nullable<Text>,
        faculty_notes -> Nullable<Text>,
        approved_by -> Nullable<Text>,
        approved_at -> Nullable<BigInt>,
        collected_at -> Nullable<BigInt>,
        returned_at -> Nullable<BigInt>,
        requested_at -> BigInt,
        updated_at -> BigInt,
    }
}
diesel::table! {
    review_tickets (id) {
        id -> Text,
        kind -> Text,
        title -> Text,
        description -> Text,
        category -> Nullable<Text>,
        image -> Nullable<Text>,
        created_by -> Text,
        status -> Text,
        approved_by -> Nullable<Text>,
        approved_at -> Nullable<BigInt>,
        completed_at -> Nullable<BigInt>,
        rejection_reason -> Nullable<Text>,
        rectified_image -> Nullable<Text>,
        created_at -> BigInt,
        updated_at -> BigInt,
    }
}
diesel::table! {
    opportunities (id) {
        id -> Text,
        title -> Text,
        opportunity_type -> Text,
        description -> Text,
        start_date -> Text,
        end_date -> Text,
        application_start_date -> Text,
        application_end_date -> Text,
        remuneration -> Nullable<Text>,
        capacity -> BigInt,
        faculty_id -> Text,
        status -> Text,
        created_at -> BigInt,
        updated_at -> BigInt,
        accepted_at -> Nullable<BigInt>,
    }
}
diesel::table! {
    opportunity_applications (id) {
        id -> Text,
        opportunity_id -> Text,
        student_id -> Text,
        status -> Text,
        resume_name -> Text,
        resume_key -> Text,
        applied_at -> BigInt,
        updated_at -> BigInt,
    }
}
diesel::table! {
    domains (id) {
        id -> Text,
        name -> Text,
        description -> Nullable<Text>,
        created_at -> BigInt,
    }
}
diesel::table! {
    domain_coordinators (id) {
        id -> Text,
        domain_id -> Text,
        faculty_id -> Text,
        assigned_by -> Text,
        assigned_at -> BigInt,
    }
}
diesel::table! {
    courses (id) {
        id -> Text,
        code -> Text,
        name -> Text,
        description -> Nullable<Text>,
        faculty_id -> Text,
        created_at -> BigInt,
    }
}
diesel::table! {
    enrollments (id) {
        id -> Text,
        course_id -> Text,
        student_id -> Text,
        section -> Text,
        grade -> Nullable<Text>,
        enrolled_at -> BigInt,
    }
}
diesel::table! {
    projects (id) {
        id -> Text,
        name -> Text,
        description -> Text,
        components_needed -> Text,
        expected_completion_date -> Text,
        kind -> Text,
        status -> Text,
        created_by -> Text,
        created_at -> BigInt,
        modified_by -> Nullable<Text>,
        modified_at -> BigInt,
    }
}
diesel::table! {
    project_requests (id) {
        id -> Text,
        project_id -> Text,
        student_id -> Text,
        faculty_id -> Text,
        status -> Text,
        student_notes -> Nullable<Text>,
        faculty_notes -> Nullable<Text>,
        request_date -> BigInt,
        accepted_date -> Nullable<BigInt>,
        rejected_date -> Nullable<BigInt>,
    }
}
diesel::allow_tables_to_appear_in_same_query!(
    users,
    faculty_profiles,
    student_profiles,
    inventory_items,
    checkout_requests,
    review_tickets,
    opportunities,
    opportunity_applications,
    domains,
    domain_coordinators,
    courses,
    enrollments,
    projects,
    project_requests,
);
