// Hand-written to match the table created by `DieselRecordRepository::init_schema`.

diesel::table! {
    pdf_common_datas (id) {
        id -> Integer,
        file_no -> Nullable<Text>,
        date_of_birth -> Nullable<Text>,
        place_of_birth -> Nullable<Text>,
        sex -> Nullable<Text>,
        forenames -> Nullable<Text>,
        family_name -> Nullable<Text>,
        nationality -> Nullable<Text>,
        casetown -> Nullable<Text>,
        casecountry -> Nullable<Text>,
        casedate -> Nullable<Text>,
        #[sql_name = "type"]
        doc_type -> Nullable<Text>,
        number -> Nullable<Text>,
        raw_text -> Text,
        created_at -> Text,
    }
}
