// Tables read and written by the matcher service.

diesel::table! {
    catalog_products (id) {
        id -> Integer,
        identifier -> Text,
        name -> Text,
        description -> Nullable<Text>,
        embedding -> Nullable<Binary>,
        embedding_model -> Nullable<Text>,
    }
}

diesel::table! {
    line_item_matches (id) {
        id -> Integer,
        batch_reference -> Text,
        line_number -> Integer,
        product_code -> Nullable<Text>,
        product_name -> Nullable<Text>,
        match_method -> Text,
        match_score -> Float,
        diagnostic -> Nullable<Text>,
        created_at -> Timestamp,
    }
}
